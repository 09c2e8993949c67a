use image::GrayImage;

use crate::shared::emotion::Emotion;

/// Classifies a grayscale face crop into a distribution over [`Emotion`]s.
///
/// Implementations resize the crop to whatever their model expects.
pub trait EmotionClassifier: Send {
    fn classify(&mut self, face: &GrayImage) -> Result<EmotionScores, Box<dyn std::error::Error>>;
}

/// Per-emotion probabilities indexed by [`Emotion::code`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionScores {
    probabilities: [f32; 7],
}

impl EmotionScores {
    pub fn new(probabilities: [f32; 7]) -> Self {
        Self { probabilities }
    }

    pub fn probability(&self, emotion: Emotion) -> f32 {
        self.probabilities[emotion.code() as usize]
    }

    /// Highest-scoring emotion and its probability.
    ///
    /// Ties resolve to the emotion with the lowest code.
    pub fn top(&self) -> (Emotion, f32) {
        let mut best = (Emotion::ALL[0], self.probabilities[0]);
        for emotion in Emotion::ALL.into_iter().skip(1) {
            let p = self.probability(emotion);
            if p > best.1 {
                best = (emotion, p);
            }
        }
        best
    }
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![1.0 / logits.len().max(1) as f32; logits.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}
