use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::capture::domain::frame_source::{CaptureError, FrameSource, FrameSourceOpener};
use crate::detection::domain::emotion_estimator::{EmotionEstimator, EstimatorError, FaceEmotion};
use crate::shared::frame::Frame;

use super::capture_logger::CaptureLogger;
use super::mailbox::Mailbox;
use super::mood_state::MoodWriter;
use super::session::SessionConfig;
use super::snapshot::{Detection, Snapshot};

/// Conditions the capture thread reports to the render loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    Started,
    /// The device could not be opened. The loop never ran.
    DeviceUnavailable(String),
    /// A read failed mid-stream. The loop has stopped.
    CaptureFailed(String),
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The capture thread acknowledged and the device is released.
    Released,
    /// No acknowledgement within the bound. The thread is detached and
    /// releases the device when its current iteration ends.
    TimedOut,
}

/// Owner-side handle to a running capture thread.
pub struct CaptureHandle {
    stop: Arc<AtomicBool>,
    released: Receiver<()>,
    thread: Option<JoinHandle<()>>,
    outcome: Option<ShutdownOutcome>,
}

impl CaptureHandle {
    /// Ask the loop to exit at its next iteration check.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Stop the loop and wait up to `timeout` for the device release.
    ///
    /// Calling this again returns the first outcome without waiting.
    pub fn shutdown(&mut self, timeout: Duration) -> ShutdownOutcome {
        if let Some(outcome) = self.outcome {
            return outcome;
        }
        self.request_stop();

        let outcome = match self.released.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(thread) = self.thread.take() {
                    if thread.join().is_err() {
                        log::error!("Capture thread panicked");
                    }
                }
                ShutdownOutcome::Released
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "Capture loop did not stop within {timeout:?}; proceeding without it"
                );
                self.thread = None;
                ShutdownOutcome::TimedOut
            }
        };
        self.outcome = Some(outcome);
        outcome
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.request_stop();
    }
}

/// Start the capture loop on a dedicated thread.
///
/// The device is opened on that thread, so the opener's source type does
/// not need to be `Send`.
pub fn spawn(
    opener: Box<dyn FrameSourceOpener>,
    estimator: Box<dyn EmotionEstimator>,
    mailbox: Arc<Mailbox<Snapshot>>,
    mood: MoodWriter,
    events: Sender<CaptureEvent>,
    config: SessionConfig,
    logger: Box<dyn CaptureLogger>,
) -> CaptureHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let (released_tx, released_rx) = crossbeam_channel::bounded(1);

    let failure_events = events.clone();
    let worker = CaptureWorker {
        estimator,
        mailbox,
        mood,
        events,
        config,
        logger,
        stop: Arc::clone(&stop),
    };
    let thread = std::thread::Builder::new()
        .name("capture".into())
        .spawn(move || {
            worker.run(opener);
            let _ = released_tx.send(());
        });

    let thread = match thread {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::error!("Failed to spawn capture thread: {e}");
            report_spawn_failure(&failure_events, &e);
            None
        }
    };

    CaptureHandle {
        stop,
        released: released_rx,
        thread,
        outcome: None,
    }
}

/// A loop that never started looks like a device that never opened.
fn report_spawn_failure(events: &Sender<CaptureEvent>, error: &std::io::Error) {
    let _ = events.send(CaptureEvent::DeviceUnavailable(format!(
        "could not start capture thread: {error}"
    )));
}

struct CaptureWorker {
    estimator: Box<dyn EmotionEstimator>,
    mailbox: Arc<Mailbox<Snapshot>>,
    mood: MoodWriter,
    events: Sender<CaptureEvent>,
    config: SessionConfig,
    logger: Box<dyn CaptureLogger>,
    stop: Arc<AtomicBool>,
}

impl CaptureWorker {
    fn run(mut self, opener: Box<dyn FrameSourceOpener>) {
        let source = match opener.open() {
            Ok(source) => source,
            Err(e) => {
                log::error!("{e}");
                let _ = self
                    .events
                    .send(CaptureEvent::DeviceUnavailable(e.reason().to_string()));
                return;
            }
        };
        let mut device = DeviceGuard::new(source);
        let _ = self.events.send(CaptureEvent::Started);

        let mut frames = 0usize;
        let mut last_frame_at: Option<Instant> = None;

        while !self.stop.load(Ordering::Relaxed) {
            let t0 = Instant::now();
            let frame = match device.read() {
                Ok(frame) => frame,
                Err(e) => {
                    log::error!("{e}");
                    let _ = self
                        .events
                        .send(CaptureEvent::CaptureFailed(e.reason().to_string()));
                    break;
                }
            };
            let frame = frame.resized(self.config.working_width, self.config.working_height);
            let t1 = Instant::now();

            let face = match self.estimate(&frame) {
                Ok(face) => face,
                Err(e) => {
                    log::warn!("Estimator failed on frame {}: {e}", frame.index());
                    None
                }
            };
            let t2 = Instant::now();

            if let Some(face) = face {
                self.mood.observe(face.mood());
            }
            let detection = Detection {
                face: face.map(|f| f.bbox),
                mood: self.mood.current(),
            };

            let now = Instant::now();
            let fps = last_frame_at
                .map(|prev| now.duration_since(prev).as_secs_f32())
                .filter(|secs| *secs > 0.0)
                .map_or(0.0, |secs| 1.0 / secs);
            last_frame_at = Some(now);

            let published = self.mailbox.publish(Snapshot {
                frame,
                detection,
                fps,
            });
            if !published {
                log::debug!("Mailbox closed, leaving capture loop");
                break;
            }

            frames += 1;
            self.logger.frame(frames);
            self.logger.timing("read", ms(t1 - t0));
            self.logger.timing("estimate", ms(t2 - t1));
            self.logger.metric("faces", if face.is_some() { 1.0 } else { 0.0 });
        }

        device.release();
        self.logger.summary();
        let _ = self.events.send(CaptureEvent::Stopped);
    }

    /// One estimator call as a fault-isolation unit: panics become errors.
    fn estimate(&mut self, frame: &Frame) -> Result<Option<FaceEmotion>, EstimatorError> {
        let estimator = &mut self.estimator;
        panic::catch_unwind(AssertUnwindSafe(|| estimator.estimate(frame))).unwrap_or_else(
            |payload| {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".into());
                Err(EstimatorError::Panicked(message))
            },
        )
    }
}

/// Exclusive owner of the open device; releases it exactly once.
struct DeviceGuard {
    source: Box<dyn FrameSource>,
    released: bool,
}

impl DeviceGuard {
    fn new(source: Box<dyn FrameSource>) -> Self {
        Self {
            source,
            released: false,
        }
    }

    fn read(&mut self) -> Result<Frame, CaptureError> {
        self.source.read()
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.source.release();
        log::info!("Capture device released");
    }
}

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        self.release();
    }
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
