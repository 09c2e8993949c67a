//! Scripted doubles for driving a session without a camera or models.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::capture::domain::frame_source::{CaptureError, FrameSource, FrameSourceOpener};
use crate::detection::domain::emotion_estimator::{EmotionEstimator, EstimatorError, FaceEmotion};
use crate::media::domain::media_resolver::{MediaRef, MediaResolver, ResolverError};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::emotion::{Emotion, Mood};
use crate::shared::frame::Frame;

use super::display_sink::{DisplaySink, RenderState, Status, StatusLevel};
use super::session::SessionConfig;
use super::snapshot::Snapshot;

pub const W: u32 = 8;
pub const H: u32 = 6;

pub fn config() -> SessionConfig {
    SessionConfig {
        working_width: W,
        working_height: H,
        poll_interval: Duration::from_millis(5),
        shutdown_timeout: Duration::from_secs(2),
        initial_mood: Mood::default(),
    }
}

/// Yields `frames` tiny frames (unbounded when `None`), each after
/// `delay`, then fails. Counts `release` calls.
pub struct ScriptedSource {
    frames: Option<usize>,
    delay: Duration,
    produced: usize,
    releases: Arc<AtomicUsize>,
}

impl FrameSource for ScriptedSource {
    fn read(&mut self) -> Result<Frame, CaptureError> {
        if self.frames.is_some_and(|n| self.produced >= n) {
            return Err(CaptureError::CaptureFailed("script exhausted".into()));
        }
        thread::sleep(self.delay);
        let frame = Frame::new(vec![0u8; (W * H * 3) as usize], W, H, self.produced);
        self.produced += 1;
        Ok(frame)
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn source(
    frames: Option<usize>,
    delay: Duration,
) -> (Box<dyn FrameSourceOpener>, Arc<AtomicUsize>) {
    let releases = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&releases);
    let opener = move || -> Result<Box<dyn FrameSource>, CaptureError> {
        Ok(Box::new(ScriptedSource {
            frames,
            delay,
            produced: 0,
            releases: counter,
        }))
    };
    (Box::new(opener), releases)
}

pub fn unavailable_source() -> Box<dyn FrameSourceOpener> {
    Box::new(|| -> Result<Box<dyn FrameSource>, CaptureError> {
        Err(CaptureError::DeviceUnavailable("no camera at index 3".into()))
    })
}

#[derive(Debug, Clone, Copy)]
pub enum Step {
    NoFace,
    Face(Emotion),
    Fail,
    Panic,
}

/// Answers according to `script[frame.index()]`; no face past the end.
pub struct ScriptedEstimator {
    pub script: Vec<Step>,
}

impl EmotionEstimator for ScriptedEstimator {
    fn estimate(&mut self, frame: &Frame) -> Result<Option<FaceEmotion>, EstimatorError> {
        match self.script.get(frame.index()).copied().unwrap_or(Step::NoFace) {
            Step::NoFace => Ok(None),
            Step::Face(emotion) => Ok(Some(FaceEmotion {
                bbox: BoundingBox::new(1, 1, 4, 4),
                emotion,
                confidence: 0.9,
            })),
            Step::Fail => Err(EstimatorError::Classification("malformed frame".into())),
            Step::Panic => panic!("estimator blew up"),
        }
    }
}

pub fn estimator(script: Vec<Step>) -> Box<dyn EmotionEstimator> {
    Box::new(ScriptedEstimator { script })
}

/// Fixed answer, recording every mood it was asked about.
pub struct StubResolver {
    pub result: Result<Vec<MediaRef>, ResolverError>,
    pub delay: Duration,
    pub calls: Mutex<Vec<Mood>>,
}

impl StubResolver {
    pub fn new(result: Result<Vec<MediaRef>, ResolverError>) -> Arc<Self> {
        Arc::new(Self {
            result,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn slow(result: Result<Vec<MediaRef>, ResolverError>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            result,
            delay,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Mood> {
        self.calls.lock().unwrap().clone()
    }
}

impl MediaResolver for StubResolver {
    fn resolve(&self, mood: Mood) -> Result<Vec<MediaRef>, ResolverError> {
        self.calls.lock().unwrap().push(mood);
        thread::sleep(self.delay);
        self.result.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Snapshot { index: usize, mood: Mood },
    Mood(Mood),
    Media(Vec<MediaRef>),
    Status(Status),
    Resolving(bool),
    State(RenderState),
}

#[derive(Default)]
pub struct RecordingSink {
    pub shown: Vec<Shown>,
}

impl RecordingSink {
    pub fn statuses(&self, level: StatusLevel) -> Vec<String> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Status(status) if status.level == level => Some(status.message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn media(&self) -> Option<&[MediaRef]> {
        self.shown.iter().rev().find_map(|s| match s {
            Shown::Media(media) => Some(media.as_slice()),
            _ => None,
        })
    }

    pub fn snapshot_count(&self) -> usize {
        self.shown
            .iter()
            .filter(|s| matches!(s, Shown::Snapshot { .. }))
            .count()
    }

    pub fn last_snapshot_mood(&self) -> Option<Mood> {
        self.shown.iter().rev().find_map(|s| match s {
            Shown::Snapshot { mood, .. } => Some(*mood),
            _ => None,
        })
    }
}

impl DisplaySink for RecordingSink {
    fn show_snapshot(&mut self, snapshot: &Snapshot) {
        self.shown.push(Shown::Snapshot {
            index: snapshot.frame.index(),
            mood: snapshot.detection.mood,
        });
    }

    fn show_mood(&mut self, mood: Mood) {
        self.shown.push(Shown::Mood(mood));
    }

    fn show_media(&mut self, media: &[MediaRef]) {
        self.shown.push(Shown::Media(media.to_vec()));
    }

    fn show_status(&mut self, status: &Status) {
        self.shown.push(Shown::Status(status.clone()));
    }

    fn set_resolving(&mut self, resolving: bool) {
        self.shown.push(Shown::Resolving(resolving));
    }

    fn set_state(&mut self, state: RenderState) {
        self.shown.push(Shown::State(state));
    }
}

/// Poll `done` until it holds, panicking after five seconds.
pub fn wait_until(mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(2));
    }
}

/// Serve `body` with `status` to every request, returning the base URL.
pub fn serve(status: u16, body: &'static str) -> String {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    thread::spawn(move || {
        for request in server.incoming_requests() {
            let response = tiny_http::Response::from_string(body).with_status_code(status);
            let _ = request.respond(response);
        }
    });
    format!("http://{addr}/results")
}
