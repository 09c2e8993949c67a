use image::{DynamicImage, Rgba, RgbaImage, RgbImage};
use iced::widget::image::Handle;

use moodtune_core::media::domain::media_resolver::MediaRef;
use moodtune_core::pipeline::display_sink::{DisplaySink, RenderState, Status};
use moodtune_core::pipeline::snapshot::Snapshot;
use moodtune_core::shared::bounding_box::BoundingBox;
use moodtune_core::shared::emotion::Mood;
use moodtune_core::shared::frame::Frame;

const OUTLINE_THICKNESS: i32 = 3;

/// What the live tab shows, fed by the render loop.
pub struct LiveView {
    pub frame: Option<Handle>,
    pub frame_size: (u32, u32),
    pub live_mood: Mood,
    pub fps: f32,
    pub face_found: bool,
    pub captured: Option<Mood>,
    pub media: Vec<MediaRef>,
    pub status: Option<Status>,
    pub resolving: bool,
    pub state: RenderState,
    pub show_overlay: bool,
    pub open_in_browser: bool,
}

impl LiveView {
    pub fn new(show_overlay: bool, open_in_browser: bool) -> Self {
        Self {
            frame: None,
            frame_size: (0, 0),
            live_mood: Mood::default(),
            fps: 0.0,
            face_found: false,
            captured: None,
            media: Vec::new(),
            status: None,
            resolving: false,
            state: RenderState::LiveDetection,
            show_overlay,
            open_in_browser,
        }
    }
}

impl DisplaySink for LiveView {
    fn show_snapshot(&mut self, snapshot: &Snapshot) {
        let mood = snapshot.detection.mood;
        let face = snapshot.detection.face.filter(|_| self.show_overlay);
        let outline = emotion_rgba(mood);
        let rgba = to_rgba(&snapshot.frame, face.as_ref(), outline);

        self.frame_size = rgba.dimensions();
        self.frame = Some(Handle::from_rgba(
            rgba.width(),
            rgba.height(),
            rgba.into_raw(),
        ));
        self.live_mood = mood;
        self.fps = snapshot.fps;
        self.face_found = snapshot.detection.face.is_some();
    }

    fn show_mood(&mut self, mood: Mood) {
        self.captured = Some(mood);
        self.media.clear();
    }

    fn show_media(&mut self, media: &[MediaRef]) {
        self.media = media.to_vec();
        if self.open_in_browser {
            if let Some(primary) = media.first() {
                if let Err(e) = open::that(&primary.url) {
                    log::warn!("Could not open {}: {e}", primary.url);
                }
            }
        }
    }

    fn show_status(&mut self, status: &Status) {
        self.status = Some(status.clone());
    }

    fn set_resolving(&mut self, resolving: bool) {
        self.resolving = resolving;
    }

    fn set_state(&mut self, state: RenderState) {
        if state == RenderState::LiveDetection {
            self.captured = None;
            self.media.clear();
        }
        self.state = state;
    }
}

fn emotion_rgba(mood: Mood) -> Rgba<u8> {
    let rgb = mood.emotion.colors().0;
    Rgba([(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 255])
}

/// Expand an RGB frame to RGBA, outlining `face` when given.
fn to_rgba(frame: &Frame, face: Option<&BoundingBox>, color: Rgba<u8>) -> RgbaImage {
    let mut rgba = match RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec()) {
        Some(rgb) => DynamicImage::ImageRgb8(rgb).into_rgba8(),
        None => RgbaImage::new(frame.width(), frame.height()),
    };
    if let Some(bbox) = face.and_then(|b| b.clamp_to(frame.width(), frame.height())) {
        draw_outline(&mut rgba, &bbox, color, OUTLINE_THICKNESS);
    }
    rgba
}

/// `bbox` must already lie inside the image.
fn draw_outline(img: &mut RgbaImage, bbox: &BoundingBox, color: Rgba<u8>, thickness: i32) {
    let x0 = bbox.x;
    let y0 = bbox.y;
    let x1 = bbox.x + bbox.width;
    let y1 = bbox.y + bbox.height;
    let t = thickness.min(bbox.width / 2).min(bbox.height / 2).max(1);

    for y in y0..y1 {
        for x in x0..x1 {
            let on_edge = x < x0 + t || x >= x1 - t || y < y0 + t || y >= y1 - t;
            if on_edge {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}
