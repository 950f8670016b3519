use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(
        default = "default_log_level",
        deserialize_with = "deserialize_log_level"
    )]
    pub log_level: LogLevel,
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_window_title() -> String {
    "Image Classifier".to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OverlayConfig {
    #[serde(default)]
    pub red: u8,
    #[serde(default = "default_green")]
    pub green: u8,
    #[serde(default)]
    pub blue: u8,
    #[serde(default = "default_origin_x")]
    pub origin_x: i32,
    #[serde(default = "default_origin_y")]
    pub origin_y: i32,
    #[serde(default = "default_font_scale")]
    pub font_scale: f64,
    #[serde(default = "default_thickness")]
    pub thickness: i32,
}

fn default_green() -> u8 {
    255
}

fn default_origin_x() -> i32 {
    10
}

fn default_origin_y() -> i32 {
    20
}

fn default_font_scale() -> f64 {
    1.2
}

fn default_thickness() -> i32 {
    2
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            red: 0,
            green: default_green(),
            blue: 0,
            origin_x: default_origin_x(),
            origin_y: default_origin_y(),
            font_scale: default_font_scale(),
            thickness: default_thickness(),
        }
    }
}

/// Capture on a separate thread, handing frames over a depth-1 channel.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub enum LogLevel {
    Debug,
    Info,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug` or `info`.",
                other
            )),
        }
    }
}

/// Every layer is optional: built-in defaults, `configuration/base.yaml`,
/// `configuration/<APP_ENVIRONMENT>.yaml`, then `TFC_` environment variables.
pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("no current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let config = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(false))
        .add_source(
            config::File::from(
                configuration_directory.join(format!("{}.yaml", environment.as_str())),
            )
            .required(false),
        )
        .add_source(
            config::Environment::with_prefix("TFC")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let config: Config = config.try_deserialize::<Config>()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn from_yaml(yaml: &str) -> Result<Config, config::ConfigError> {
        config::Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize::<Config>()
    }

    #[test]
    fn test_defaults_without_any_source() {
        let config = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize::<Config>()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.window_title, "Image Classifier");
        assert_eq!(config.overlay, OverlayConfig::default());
        assert!(!config.pipeline.enabled);
    }

    #[test]
    fn test_partial_overrides() {
        let config = from_yaml(
            "log_level: DEBUG\noverlay:\n  red: 255\n  green: 0\npipeline:\n  enabled: true\n",
        )
        .unwrap();

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.overlay.red, 255);
        assert_eq!(config.overlay.green, 0);
        assert_eq!(config.overlay.thickness, 2);
        assert!(config.pipeline.enabled);
    }

    #[test]
    fn test_invalid_log_level_is_rejected() {
        assert!(from_yaml("log_level: trace\n").is_err());
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::try_from("Production".to_string())
                .unwrap()
                .as_str(),
            "production"
        );
        assert!(Environment::try_from("staging".to_string()).is_err());
    }
}
