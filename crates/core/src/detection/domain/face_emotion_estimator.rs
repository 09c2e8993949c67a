use image::GrayImage;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

use super::emotion_classifier::EmotionClassifier;
use super::emotion_estimator::{EmotionEstimator, EstimatorError, FaceEmotion};
use super::face_detector::FaceDetector;
use super::face_selection::FaceSelection;

/// Detector + selection policy + classifier composed into one estimator.
///
/// The selected box is clamped to the frame, cut out of a grayscale copy of
/// the frame and handed to the classifier.
pub struct FaceEmotionEstimator {
    detector: Box<dyn FaceDetector>,
    classifier: Box<dyn EmotionClassifier>,
    selection: FaceSelection,
}

impl FaceEmotionEstimator {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        classifier: Box<dyn EmotionClassifier>,
        selection: FaceSelection,
    ) -> Self {
        Self {
            detector,
            classifier,
            selection,
        }
    }

    pub fn selection(&self) -> FaceSelection {
        self.selection
    }
}

impl EmotionEstimator for FaceEmotionEstimator {
    fn estimate(&mut self, frame: &Frame) -> Result<Option<FaceEmotion>, EstimatorError> {
        let faces = self
            .detector
            .detect(frame)
            .map_err(|e| EstimatorError::Detection(e.to_string()))?;

        let Some(bbox) = self
            .selection
            .select(&faces, frame.width(), frame.height())
            .and_then(|b| b.clamp_to(frame.width(), frame.height()))
        else {
            return Ok(None);
        };

        let crop = crop_gray(frame, &bbox);
        let scores = self
            .classifier
            .classify(&crop)
            .map_err(|e| EstimatorError::Classification(e.to_string()))?;
        let (emotion, confidence) = scores.top();

        Ok(Some(FaceEmotion {
            bbox,
            emotion,
            confidence,
        }))
    }
}

fn crop_gray(frame: &Frame, bbox: &BoundingBox) -> GrayImage {
    let gray = frame.to_gray();
    image::imageops::crop_imm(
        &gray,
        bbox.x as u32,
        bbox.y as u32,
        bbox.width as u32,
        bbox.height as u32,
    )
    .to_image()
}
