use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The device could not be opened (absent, busy, or permission denied).
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),
    /// A read failed after the device was opened.
    #[error("camera read failed: {0}")]
    CaptureFailed(String),
}

impl CaptureError {
    /// The underlying cause without the category prefix.
    pub fn reason(&self) -> &str {
        match self {
            CaptureError::DeviceUnavailable(reason) | CaptureError::CaptureFailed(reason) => reason,
        }
    }
}

/// An opened capture device producing frames at its native rate.
///
/// Sources are created and used on the capture thread only, so they need
/// not be `Send`.
pub trait FrameSource {
    /// Blocks until the next frame is available.
    fn read(&mut self) -> Result<Frame, CaptureError>;

    /// Releases the device. Must be safe to call more than once.
    fn release(&mut self);
}

/// Opens a [`FrameSource`] on the thread that will own it.
pub trait FrameSourceOpener: Send {
    fn open(self: Box<Self>) -> Result<Box<dyn FrameSource>, CaptureError>;
}

impl<F> FrameSourceOpener for F
where
    F: FnOnce() -> Result<Box<dyn FrameSource>, CaptureError> + Send,
{
    fn open(self: Box<Self>) -> Result<Box<dyn FrameSource>, CaptureError> {
        (*self)()
    }
}
