use std::fmt;

use thiserror::Error;

use crate::shared::constants::VIDEO_WATCH_URL;
use crate::shared::emotion::Mood;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    #[error("network error: {0}")]
    Network(String),
    #[error("search returned HTTP {0}")]
    Status(u16),
    #[error("no results for {0}")]
    NoMatch(String),
    #[error("song table: {0}")]
    Table(String),
    #[error("could not start search: {0}")]
    Worker(String),
}

/// A playable media reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub url: String,
    pub title: Option<String>,
}

impl MediaRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
        }
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..self
        }
    }

    /// Canonical watch URL for an 11-character video id.
    pub fn from_video_id(id: &str) -> Self {
        Self::new(format!("{VIDEO_WATCH_URL}?v={id}"))
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(f, "{title} ({})", self.url),
            None => f.write_str(&self.url),
        }
    }
}

/// Maps a mood to playable media.
///
/// A successful result is never empty; the first entry is the primary
/// reference. Implementations block and must not be called on the render
/// thread.
pub trait MediaResolver: Send + Sync {
    fn resolve(&self, mood: Mood) -> Result<Vec<MediaRef>, ResolverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_video_id_builds_watch_url() {
        let media = MediaRef::from_video_id("abc12345678");
        assert_eq!(media.url, "https://www.youtube.com/watch?v=abc12345678");
        assert_eq!(media.title, None);
    }

    #[test]
    fn test_display_includes_title() {
        let media = MediaRef::new("https://example.com/a").with_title("Rainy Day");
        assert_eq!(media.to_string(), "Rainy Day (https://example.com/a)");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ResolverError::Status(503).to_string(), "search returned HTTP 503");
    }
}
