use std::sync::Arc;
use std::time::Duration;

use crate::capture::domain::frame_source::FrameSourceOpener;
use crate::detection::domain::emotion_estimator::EmotionEstimator;
use crate::media::domain::media_resolver::MediaResolver;
use crate::shared::constants::{WORKING_HEIGHT, WORKING_WIDTH};
use crate::shared::emotion::Mood;

use super::capture_logger::{CaptureLogger, LogCaptureLogger};
use super::capture_loop;
use super::mailbox::Mailbox;
use super::mood_state::SessionMood;
use super::render_loop::RenderLoop;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Frames are resized to this before estimation and display.
    pub working_width: u32,
    pub working_height: u32,
    /// How long the render loop waits for a command between ticks.
    pub poll_interval: Duration,
    /// Bound on waiting for the capture thread at quit.
    pub shutdown_timeout: Duration,
    pub initial_mood: Mood,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            working_width: WORKING_WIDTH,
            working_height: WORKING_HEIGHT,
            poll_interval: Duration::from_millis(50),
            shutdown_timeout: Duration::from_secs(2),
            initial_mood: Mood::default(),
        }
    }
}

/// Wire a session together and start capturing.
///
/// Returns immediately; device errors arrive later as status updates on
/// the render loop.
pub fn start(
    opener: Box<dyn FrameSourceOpener>,
    estimator: Box<dyn EmotionEstimator>,
    resolver: Arc<dyn MediaResolver>,
    config: SessionConfig,
) -> RenderLoop {
    start_with_logger(
        opener,
        estimator,
        resolver,
        config,
        Box::new(LogCaptureLogger::default()),
    )
}

/// [`start`] with a caller-chosen capture logger.
pub fn start_with_logger(
    opener: Box<dyn FrameSourceOpener>,
    estimator: Box<dyn EmotionEstimator>,
    resolver: Arc<dyn MediaResolver>,
    config: SessionConfig,
    logger: Box<dyn CaptureLogger>,
) -> RenderLoop {
    let mailbox = Arc::new(Mailbox::new());
    let (writer, reader) = SessionMood::new(config.initial_mood);
    let (events_tx, events_rx) = crossbeam_channel::unbounded();

    let capture = capture_loop::spawn(
        opener,
        estimator,
        Arc::clone(&mailbox),
        writer,
        events_tx,
        config.clone(),
        logger,
    );

    RenderLoop::new(mailbox, reader, events_rx, capture, resolver, config)
}
