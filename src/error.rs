use crate::{
    camera::CameraError, classifier::ClassifierError, display::DisplayError,
    engine::EngineError, vocabulary::VocabularyError,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Vocabulary(#[from] VocabularyError),
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("Model error: {0}")]
    Engine(#[from] EngineError),
    #[error("Classification failed: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("Display error: {0}")]
    Display(#[from] DisplayError),
    #[error("Failed to start capture thread: {0}")]
    SpawnCaptureFailed(std::io::Error),
    #[error("Capture thread panicked")]
    CaptureThreadPanicked,
    #[error("Status printer failed: {0}")]
    StatusPrinter(#[from] tokio::task::JoinError),
}

/// Logs the outcome of a run once and maps it to a process exit status.
pub fn exit_status(result: &Result<(), AppError>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{}", e);
            1
        }
    }
}
