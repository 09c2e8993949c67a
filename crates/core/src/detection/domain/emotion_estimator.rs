use thiserror::Error;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::emotion::{Emotion, Mood};
use crate::shared::frame::Frame;

/// Failure inside a single estimation call.
///
/// The capture loop recovers from these locally by treating the frame as
/// having no face.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EstimatorError {
    #[error("face detection failed: {0}")]
    Detection(String),
    #[error("emotion classification failed: {0}")]
    Classification(String),
    #[error("estimator panicked: {0}")]
    Panicked(String),
}

/// The emotion read off the selected face in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceEmotion {
    pub bbox: BoundingBox,
    pub emotion: Emotion,
    /// Probability of `emotion`, in `0.0..=1.0`.
    pub confidence: f32,
}

impl FaceEmotion {
    pub fn mood(&self) -> Mood {
        Mood::from_confidence(self.emotion, self.confidence)
    }
}

/// Maps a frame to zero or one face emotion.
///
/// `Ok(None)` means no face was found, which is a normal outcome.
pub trait EmotionEstimator: Send {
    fn estimate(&mut self, frame: &Frame) -> Result<Option<FaceEmotion>, EstimatorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_truncates_confidence_to_level() {
        let face = FaceEmotion {
            bbox: BoundingBox::new(0, 0, 10, 10),
            emotion: Emotion::Surprise,
            confidence: 0.736,
        };
        assert_eq!(face.mood(), Mood::new(Emotion::Surprise, 73));
    }

    #[test]
    fn test_error_messages() {
        let err = EstimatorError::Detection("bad tensor".into());
        assert_eq!(err.to_string(), "face detection failed: bad tensor");
    }
}
