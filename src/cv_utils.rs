use crate::config::OverlayConfig;
use opencv::{
    core::{Mat, Point, Scalar},
    imgproc,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CvUtilsError {
    #[error("Failed to draw overlay: {0}")]
    DrawFailed(opencv::Error),
}

/// Style of the status text burned into each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlay {
    pub color: Scalar,
    pub origin: Point,
    pub font_scale: f64,
    pub thickness: i32,
}

impl Default for Overlay {
    fn default() -> Self {
        Self {
            color: Scalar::new(0.0, 255.0, 0.0, 0.0),
            origin: Point::new(10, 20),
            font_scale: 1.2,
            thickness: 2,
        }
    }
}

impl From<&OverlayConfig> for Overlay {
    fn from(config: &OverlayConfig) -> Self {
        // Mat channels are BGR
        Self {
            color: Scalar::new(
                config.blue as f64,
                config.green as f64,
                config.red as f64,
                0.0,
            ),
            origin: Point::new(config.origin_x, config.origin_y),
            font_scale: config.font_scale,
            thickness: config.thickness,
        }
    }
}

impl Overlay {
    pub fn annotate(&self, frame: &mut Mat, text: &str) -> Result<(), CvUtilsError> {
        imgproc::put_text(
            frame,
            text,
            self.origin,
            imgproc::FONT_HERSHEY_PLAIN,
            self.font_scale,
            self.color,
            self.thickness,
            imgproc::LINE_8,
            false,
        )
        .map_err(CvUtilsError::DrawFailed)
    }
}
