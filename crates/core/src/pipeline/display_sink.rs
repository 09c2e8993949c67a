use std::fmt;

use crate::media::domain::media_resolver::MediaRef;
use crate::shared::emotion::Mood;

use super::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    LiveDetection,
    MoodResolved,
    /// Absorbing: no command leaves this state.
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// A user-facing status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub message: String,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// The only surface a front end implements.
///
/// All calls happen on the render thread and must return promptly.
pub trait DisplaySink {
    /// A new frame with its detection, live mode only.
    fn show_snapshot(&mut self, snapshot: &Snapshot);

    /// The mood captured for resolution.
    fn show_mood(&mut self, mood: Mood);

    /// Resolved media, primary first. Never empty.
    fn show_media(&mut self, media: &[MediaRef]);

    fn show_status(&mut self, status: &Status);

    /// Whether a resolution is in flight.
    fn set_resolving(&mut self, resolving: bool);

    fn set_state(&mut self, state: RenderState);
}
