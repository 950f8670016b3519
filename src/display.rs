use opencv::{core::Mat, highgui};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Failed to create window {title}: {source}")]
    CreateWindowFailed {
        title: String,
        #[source]
        source: opencv::Error,
    },
    #[error("Failed to show frame: {0}")]
    ShowFailed(opencv::Error),
}

pub trait DisplaySink {
    /// Renders `frame`. Returns `true` when the user asked to quit.
    fn show(&mut self, frame: &Mat) -> Result<bool, DisplayError>;
}

pub struct Window {
    title: String,
}

impl Window {
    pub fn new(title: &str) -> Result<Self, DisplayError> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE).map_err(|source| {
            DisplayError::CreateWindowFailed {
                title: title.to_string(),
                source,
            }
        })?;
        Ok(Self {
            title: title.to_string(),
        })
    }
}

impl DisplaySink for Window {
    fn show(&mut self, frame: &Mat) -> Result<bool, DisplayError> {
        highgui::imshow(&self.title, frame).map_err(DisplayError::ShowFailed)?;
        let key = highgui::wait_key(1).map_err(DisplayError::ShowFailed)?;
        Ok(key >= 0)
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_window(&self.title) {
            tracing::warn!("Failed to close window {}: {}", self.title, e);
        }
    }
}
