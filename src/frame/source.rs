//! Camera device abstraction.
//!
//! A [`CameraProvider`] opens devices by index; each open device is a
//! [`FrameSource`] owned by exactly one pipeline controller.

use super::Frame;

/// Errors from opening or reading a camera device.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameSourceError {
    #[error("camera {index} unavailable: {reason}")]
    DeviceUnavailable { index: u32, reason: String },
    #[error("frame read failed: {0}")]
    ReadError(String),
    #[error("end of stream")]
    EndOfStream,
}

/// Requested capture resolution.
///
/// Advisory only: devices may deliver a different size and nothing
/// downstream relies on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureHint {
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureHint {
    fn default() -> Self {
        use crate::common::constants::{DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH};
        Self {
            width: DEFAULT_CAPTURE_WIDTH,
            height: DEFAULT_CAPTURE_HEIGHT,
        }
    }
}

/// An open camera device.
pub trait FrameSource: Send {
    /// Read the next frame.
    fn read_frame(&mut self) -> Result<Frame, FrameSourceError>;

    /// Release the device. Calling this more than once is harmless; reads
    /// after release fail with [`FrameSourceError::ReadError`].
    fn release(&mut self);

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

/// Opens camera devices by index.
pub trait CameraProvider: Send + Sync {
    fn open(&self, index: u32, hint: CaptureHint) -> Result<Box<dyn FrameSource>, FrameSourceError>;
}
