use std::time::Instant;

use image::imageops::FilterType;
use image::{GrayImage, RgbImage};
use ndarray::ArrayView3;

/// One camera read: contiguous RGB bytes in row-major order.
///
/// Frames are immutable once built. Resizing produces a new frame that
/// keeps the original sequence number and capture timestamp.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
    captured_at: Instant,
}

pub const CHANNELS: u8 = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        Self::captured(data, width, height, index, Instant::now())
    }

    pub fn captured(
        data: Vec<u8>,
        width: u32,
        height: u32,
        index: usize,
        captured_at: Instant,
    ) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (CHANNELS as usize),
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
            captured_at,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Scale to exactly `width × height`. A frame already at that size is
    /// returned unchanged.
    pub fn resized(self, width: u32, height: u32) -> Frame {
        if self.width == width && self.height == height {
            return self;
        }
        let Self {
            data,
            width: src_w,
            height: src_h,
            index,
            captured_at,
        } = self;
        let Some(src) = RgbImage::from_raw(src_w, src_h, data) else {
            return Frame::captured(
                vec![0; (width * height * CHANNELS as u32) as usize],
                width,
                height,
                index,
                captured_at,
            );
        };
        let scaled = image::imageops::resize(&src, width, height, FilterType::Triangle);
        Frame::captured(scaled.into_raw(), width, height, index, captured_at)
    }

    /// Luma conversion of the whole frame.
    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let i = ((y * self.width + x) * CHANNELS as u32) as usize;
            let (r, g, b) = (
                self.data[i] as f32,
                self.data[i + 1] as f32,
                self.data[i + 2] as f32,
            );
            image::Luma([(0.299 * r + 0.587 * g + 0.114 * b).round() as u8])
        })
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            CHANNELS as usize,
        )
    }
}
