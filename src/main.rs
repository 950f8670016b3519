use clap::Parser;
use std::process::ExitCode;
use tf_classifier::{cli::Args, config, error::exit_status, start_app, telemetry};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = match config::get_configuration() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    telemetry::init_tracing(&config.log_level);

    let result = start_app(config, args).await;
    ExitCode::from(exit_status(&result))
}
