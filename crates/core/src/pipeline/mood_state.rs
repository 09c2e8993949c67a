use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use crate::shared::emotion::{Emotion, Mood};

/// Session-wide mood, written only by the capture loop.
///
/// Emotion and level are packed into one atomic so readers can never see
/// a label from one frame next to a level from another.
pub struct SessionMood;

impl SessionMood {
    /// Create the shared state. The writer is not `Clone`, which keeps a
    /// single writer per session.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(initial: Mood) -> (MoodWriter, MoodReader) {
        let cell = Arc::new(AtomicU16::new(pack(initial)));
        (
            MoodWriter {
                cell: Arc::clone(&cell),
            },
            MoodReader { cell },
        )
    }
}

pub struct MoodWriter {
    cell: Arc<AtomicU16>,
}

impl MoodWriter {
    /// Record the mood read off the current frame.
    pub fn observe(&self, mood: Mood) {
        self.cell.store(pack(mood), Ordering::Release);
    }

    pub fn current(&self) -> Mood {
        unpack(self.cell.load(Ordering::Acquire))
    }
}

#[derive(Clone)]
pub struct MoodReader {
    cell: Arc<AtomicU16>,
}

impl MoodReader {
    pub fn current(&self) -> Mood {
        unpack(self.cell.load(Ordering::Acquire))
    }
}

fn pack(mood: Mood) -> u16 {
    ((mood.emotion.code() as u16) << 8) | mood.level as u16
}

fn unpack(bits: u16) -> Mood {
    let emotion = Emotion::from_code((bits >> 8) as u8).unwrap_or(Emotion::Neutral);
    Mood::new(emotion, (bits & 0xff) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_mood_is_visible() {
        let (_writer, reader) = SessionMood::new(Mood::default());
        assert_eq!(reader.current(), Mood::new(Emotion::Neutral, 50));
    }

    #[test]
    fn test_observe_updates_every_reader() {
        let (writer, reader) = SessionMood::new(Mood::default());
        let other = reader.clone();
        writer.observe(Mood::new(Emotion::Happy, 91));
        assert_eq!(reader.current(), Mood::new(Emotion::Happy, 91));
        assert_eq!(other.current(), Mood::new(Emotion::Happy, 91));
        assert_eq!(writer.current(), Mood::new(Emotion::Happy, 91));
    }

    #[test]
    fn test_every_emotion_survives_packing() {
        for emotion in Emotion::ALL {
            for level in [0, 1, 50, 99, 100] {
                let mood = Mood::new(emotion, level);
                assert_eq!(unpack(pack(mood)), mood);
            }
        }
    }
}
