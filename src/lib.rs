mod cv_utils;
mod status;

pub mod app;
pub mod camera;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod telemetry;
pub mod vocabulary;

pub use app::start_app;
pub use cv_utils::{CvUtilsError, Overlay};
pub use error::AppError;
