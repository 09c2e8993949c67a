use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

use crate::capture::domain::frame_source::{CaptureError, FrameSource, FrameSourceOpener};
use crate::shared::frame::Frame;

/// Webcam capture through nokhwa, decoded to RGB.
pub struct CameraFrameSource {
    camera: Camera,
    streaming: bool,
    next_index: usize,
}

impl CameraFrameSource {
    /// Open camera `index` and start streaming at its highest frame rate.
    pub fn open(index: u32) -> Result<Self, CaptureError> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| CaptureError::DeviceUnavailable(format!("camera {index}: {e}")))?;
        camera
            .open_stream()
            .map_err(|e| CaptureError::DeviceUnavailable(format!("camera {index}: {e}")))?;

        let resolution = camera.resolution();
        log::info!(
            "Opened camera {index} ({}) at {}x{}",
            camera.info().human_name(),
            resolution.width(),
            resolution.height()
        );

        Ok(Self {
            camera,
            streaming: true,
            next_index: 0,
        })
    }

    /// Deferred opener for use on the capture thread.
    pub fn opener(index: u32) -> Box<dyn FrameSourceOpener> {
        Box::new(move || -> Result<Box<dyn FrameSource>, CaptureError> {
            Ok(Box::new(CameraFrameSource::open(index)?))
        })
    }
}

impl FrameSource for CameraFrameSource {
    fn read(&mut self) -> Result<Frame, CaptureError> {
        if !self.streaming {
            return Err(CaptureError::CaptureFailed("camera released".into()));
        }
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;
        let rgb = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::CaptureFailed(format!("decode: {e}")))?;

        let (width, height) = rgb.dimensions();
        let frame = Frame::new(rgb.into_raw(), width, height, self.next_index);
        self.next_index += 1;
        Ok(frame)
    }

    fn release(&mut self) {
        if !self.streaming {
            return;
        }
        self.streaming = false;
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("Error stopping camera stream: {e}");
        }
    }
}

impl Drop for CameraFrameSource {
    fn drop(&mut self) {
        self.release();
    }
}
