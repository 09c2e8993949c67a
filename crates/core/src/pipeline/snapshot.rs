use crate::shared::bounding_box::BoundingBox;
use crate::shared::emotion::Mood;
use crate::shared::frame::Frame;

/// What the estimator found in one frame.
///
/// `face` is absent on no-face frames, in which case `mood` is the carried
/// over session mood rather than a reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub face: Option<BoundingBox>,
    pub mood: Mood,
}

/// One published unit of the capture loop.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub frame: Frame,
    pub detection: Detection,
    /// Instantaneous capture rate at publish time.
    pub fps: f32,
}
