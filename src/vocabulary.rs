use std::{
    fs::File,
    io::{self, BufRead},
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Error, Debug)]
pub enum VocabularyError {
    #[error("Failed to read descriptions file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Class labels, index-aligned with the network's output vector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    labels: Vec<String>,
}

impl Vocabulary {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Reads one label per line. Blank lines are kept so indices stay aligned.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VocabularyError> {
        let path = path.as_ref();
        let labels = read_lines(path).map_err(|source| VocabularyError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!("Loaded {} labels from {:?}", labels.len(), path);
        Ok(Self { labels })
    }

    pub fn resolve(&self, index: usize) -> &str {
        self.labels
            .get(index)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LABEL)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let file = File::open(path)?;
    let reader = io::BufReader::new(file);
    reader.lines().collect()
}
