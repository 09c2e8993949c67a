use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::capture::domain::frame_source::{CaptureError, FrameSource, FrameSourceOpener};
use crate::shared::frame::Frame;

/// Replays a recorded clip as if it were a camera.
///
/// Frames are decoded via ffmpeg-next and converted to RGB24. When `paced`
/// is set, reads are throttled to the clip's frame rate. Reaching the end
/// of the clip is reported as [`CaptureError::CaptureFailed`].
pub struct VideoFileFrameSource {
    input_ctx: Option<ffmpeg_next::format::context::Input>,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    video_stream_index: usize,
    width: u32,
    height: u32,
    frame_interval: Option<Duration>,
    last_emit: Option<Instant>,
    next_index: usize,
    flushing: bool,
}

impl VideoFileFrameSource {
    pub fn open(path: &Path, paced: bool) -> Result<Self, CaptureError> {
        let unavailable = |e: ffmpeg_next::Error| {
            CaptureError::DeviceUnavailable(format!("{}: {e}", path.display()))
        };

        ffmpeg_next::init().map_err(unavailable)?;
        let ictx = ffmpeg_next::format::input(&path).map_err(unavailable)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| {
                CaptureError::DeviceUnavailable(format!("{}: no video stream", path.display()))
            })?;
        let video_stream_index = stream.index();

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(unavailable)?;
        let decoder = codec_ctx.decoder().video().map_err(unavailable)?;
        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(unavailable)?;

        log::info!(
            "Opened {} ({width}x{height} @ {fps:.1} fps)",
            path.display()
        );

        Ok(Self {
            input_ctx: Some(ictx),
            decoder,
            scaler,
            video_stream_index,
            width,
            height,
            frame_interval: (paced && fps > 0.0).then(|| Duration::from_secs_f64(1.0 / fps)),
            last_emit: None,
            next_index: 0,
            flushing: false,
        })
    }

    pub fn opener(path: PathBuf, paced: bool) -> Box<dyn FrameSourceOpener> {
        Box::new(move || -> Result<Box<dyn FrameSource>, CaptureError> {
            Ok(Box::new(VideoFileFrameSource::open(&path, paced)?))
        })
    }

    fn try_receive(&mut self) -> Option<Result<Frame, CaptureError>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return None;
        }
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = self.scaler.run(&decoded, &mut rgb_frame) {
            return Some(Err(CaptureError::CaptureFailed(e.to_string())));
        }
        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, self.next_index);
        self.next_index += 1;
        Some(Ok(frame))
    }

    fn decode_next(&mut self) -> Result<Frame, CaptureError> {
        if let Some(result) = self.try_receive() {
            return result;
        }
        if self.flushing {
            return Err(end_of_clip());
        }

        loop {
            let Some(ictx) = self.input_ctx.as_mut() else {
                return Err(CaptureError::CaptureFailed("video source released".into()));
            };
            let Some((stream, packet)) = ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                return self.try_receive().unwrap_or_else(|| Err(end_of_clip()));
            };

            if stream.index() != self.video_stream_index {
                continue;
            }
            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }
            if let Some(result) = self.try_receive() {
                return result;
            }
        }
    }

    fn pace(&mut self) {
        if let (Some(interval), Some(last)) = (self.frame_interval, self.last_emit) {
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        self.last_emit = Some(Instant::now());
    }
}

impl FrameSource for VideoFileFrameSource {
    fn read(&mut self) -> Result<Frame, CaptureError> {
        if self.input_ctx.is_none() {
            return Err(CaptureError::CaptureFailed("video source released".into()));
        }
        let frame = self.decode_next()?;
        self.pace();
        Ok(frame)
    }

    fn release(&mut self) {
        self.input_ctx = None;
    }
}

fn end_of_clip() -> CaptureError {
    CaptureError::CaptureFailed("end of video".into())
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer,
/// dropping any per-row stride padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
