use opencv::{core::Mat, prelude::*, videoio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open capture device {device}: {source}")]
    OpenCameraFailed {
        device: String,
        #[source]
        source: opencv::Error,
    },
    #[error("Capture device {0} could not be opened")]
    NotOpened(String),
    #[error("Failed to read frame: {0}")]
    ReadFrameFailed(opencv::Error),
    #[error("Device closed: {0}")]
    DeviceClosed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Ready,
    Empty,
}

pub trait FrameSource {
    /// Reads the next frame into `frame`, reusing its buffer.
    ///
    /// Returns `FrameStatus::Empty` when the device is open but had nothing to
    /// deliver, and `CameraError::DeviceClosed` once it stops producing frames.
    fn read(&mut self, frame: &mut Mat) -> Result<FrameStatus, CameraError>;
}

pub struct Camera {
    device: String,
    capture: videoio::VideoCapture,
}

impl Camera {
    /// A numeric `device` opens that camera index, anything else is treated
    /// as a file name or stream URL.
    pub fn open(device: &str) -> Result<Self, CameraError> {
        let open_failed = |source| CameraError::OpenCameraFailed {
            device: device.to_string(),
            source,
        };
        let capture = match device.parse::<i32>() {
            Ok(index) => videoio::VideoCapture::new(index, videoio::CAP_ANY),
            Err(_) => videoio::VideoCapture::from_file(device, videoio::CAP_ANY),
        }
        .map_err(open_failed)?;

        if !capture.is_opened().map_err(open_failed)? {
            return Err(CameraError::NotOpened(device.to_string()));
        }

        tracing::info!("Opened capture device {}", device);
        Ok(Self {
            device: device.to_string(),
            capture,
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

impl FrameSource for Camera {
    fn read(&mut self, frame: &mut Mat) -> Result<FrameStatus, CameraError> {
        let grabbed = self
            .capture
            .read(frame)
            .map_err(CameraError::ReadFrameFailed)?;
        if !grabbed {
            return Err(CameraError::DeviceClosed(self.device.clone()));
        }
        if frame.empty() {
            return Ok(FrameStatus::Empty);
        }
        Ok(FrameStatus::Ready)
    }
}
