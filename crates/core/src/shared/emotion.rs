use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of facial-expression labels the classifier can produce.
///
/// Discriminants follow the FER-2013 output ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emotion {
    Angry = 0,
    Disgust = 1,
    Fear = 2,
    Happy = 3,
    Sad = 4,
    Surprise = 5,
    Neutral = 6,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Emotion> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Emotion::Angry => "Angry",
            Emotion::Disgust => "Disgust",
            Emotion::Fear => "Fear",
            Emotion::Happy => "Happy",
            Emotion::Sad => "Sad",
            Emotion::Surprise => "Surprise",
            Emotion::Neutral => "Neutral",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Emotion::Angry => "\u{1F621}",
            Emotion::Disgust => "\u{1F922}",
            Emotion::Fear => "\u{1F628}",
            Emotion::Happy => "\u{1F604}",
            Emotion::Sad => "\u{1F622}",
            Emotion::Surprise => "\u{1F632}",
            Emotion::Neutral => "\u{1F610}",
        }
    }

    /// How "full" the mood gauge should be drawn for this label, 0-100.
    pub fn fill_percentage(self) -> u8 {
        match self {
            Emotion::Happy => 100,
            Emotion::Surprise => 80,
            Emotion::Neutral => 50,
            Emotion::Sad => 30,
            Emotion::Fear | Emotion::Disgust => 20,
            Emotion::Angry => 10,
        }
    }

    /// `(foreground, background)` as 0xRRGGBB.
    pub fn colors(self) -> (u32, u32) {
        match self {
            Emotion::Happy => (0x1E88E5, 0xE3F2FD),
            Emotion::Sad => (0x1976D2, 0xE3F2FD),
            Emotion::Angry => (0xD32F2F, 0xFFEBEE),
            Emotion::Surprise => (0x0288D1, 0xE1F5FE),
            Emotion::Fear => (0x455A64, 0xCFD8DC),
            Emotion::Disgust => (0x00796B, 0xE0F2F1),
            Emotion::Neutral => (0x5C6BC0, 0xE8EAF6),
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown emotion label: {0}")]
pub struct UnknownEmotion(pub String);

impl FromStr for Emotion {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let emotion = match lowered.as_str() {
            "angry" | "anger" => Emotion::Angry,
            "disgust" | "contempt" => Emotion::Disgust,
            "fear" => Emotion::Fear,
            "happy" | "happiness" => Emotion::Happy,
            "sad" | "sadness" => Emotion::Sad,
            "surprise" => Emotion::Surprise,
            "neutral" => Emotion::Neutral,
            _ => return Err(UnknownEmotion(s.to_string())),
        };
        Ok(emotion)
    }
}

/// An emotion label together with the classifier's confidence level (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mood {
    pub emotion: Emotion,
    pub level: u8,
}

pub const DEFAULT_LEVEL: u8 = 50;

impl Mood {
    pub fn new(emotion: Emotion, level: u8) -> Self {
        Self {
            emotion,
            level: level.min(100),
        }
    }

    /// Level derived from a softmax maximum in `[0, 1]`, truncated to a
    /// whole percent.
    pub fn from_confidence(emotion: Emotion, confidence: f32) -> Self {
        let level = (confidence.clamp(0.0, 1.0) * 100.0) as u8;
        Self::new(emotion, level)
    }
}

impl Default for Mood {
    fn default() -> Self {
        Self::new(Emotion::Neutral, DEFAULT_LEVEL)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (level {})", self.emotion, self.level)
    }
}
