use std::sync::Arc;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::media::domain::media_resolver::MediaResolver;
use crate::shared::emotion::Mood;

use super::capture_loop::{CaptureEvent, CaptureHandle, ShutdownOutcome};
use super::display_sink::{DisplaySink, RenderState, Status};
use super::mailbox::Mailbox;
use super::mood_state::MoodReader;
use super::resolve_worker::{self, ResolveMessage};
use super::session::SessionConfig;
use super::snapshot::Snapshot;

/// User commands accepted by the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Freeze the current mood and resolve media for it.
    Capture,
    /// Resolve again for the captured mood (capturing first when live).
    Play,
    /// Back to live display. The session mood is untouched.
    DetectAgain,
    Quit,
}

/// Render-side half of a session.
///
/// Every method returns without waiting on the camera or the network,
/// except [`Command::Quit`], which waits for the capture thread up to the
/// configured shutdown timeout.
pub struct RenderLoop {
    state: RenderState,
    mailbox: Arc<Mailbox<Snapshot>>,
    mood: MoodReader,
    events: Receiver<CaptureEvent>,
    capture: CaptureHandle,
    resolver: Arc<dyn MediaResolver>,
    pending: Option<Receiver<ResolveMessage>>,
    captured: Option<Mood>,
    seen: u64,
    config: SessionConfig,
}

impl RenderLoop {
    pub(crate) fn new(
        mailbox: Arc<Mailbox<Snapshot>>,
        mood: MoodReader,
        events: Receiver<CaptureEvent>,
        capture: CaptureHandle,
        resolver: Arc<dyn MediaResolver>,
        config: SessionConfig,
    ) -> Self {
        Self {
            state: RenderState::LiveDetection,
            mailbox,
            mood,
            events,
            capture,
            resolver,
            pending: None,
            captured: None,
            seen: 0,
            config,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Current session mood.
    pub fn current_mood(&self) -> Mood {
        self.mood.current()
    }

    /// Mood frozen by the last capture, while in `MoodResolved`.
    pub fn captured_mood(&self) -> Option<Mood> {
        self.captured
    }

    pub fn is_resolving(&self) -> bool {
        self.pending.is_some()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// One poll: capture events, the newest snapshot, resolver results.
    pub fn tick(&mut self, sink: &mut dyn DisplaySink) {
        if self.state == RenderState::Terminated {
            return;
        }

        while let Ok(event) = self.events.try_recv() {
            self.on_capture_event(event, sink);
        }

        if self.state == RenderState::LiveDetection {
            if let Some((generation, snapshot)) = self.mailbox.take_newer(self.seen) {
                self.seen = generation;
                sink.show_snapshot(&snapshot);
            }
        }

        self.poll_resolver(sink);
    }

    /// Apply one command and return the resulting state.
    pub fn handle(&mut self, command: Command, sink: &mut dyn DisplaySink) -> RenderState {
        if self.state == RenderState::Terminated {
            log::debug!("Ignoring {command:?} after quit");
            return self.state;
        }

        match command {
            Command::Capture => self.capture_mood(sink),
            Command::Play => match self.captured {
                Some(mood) if self.state == RenderState::MoodResolved => self.dispatch(mood, sink),
                _ => self.capture_mood(sink),
            },
            Command::DetectAgain => self.detect_again(sink),
            Command::Quit => self.quit(sink),
        }
        self.state
    }

    /// Drive the loop until quit, polling `commands` between ticks.
    ///
    /// A disconnected command channel counts as quit.
    pub fn run(&mut self, sink: &mut dyn DisplaySink, commands: &Receiver<Command>) {
        while self.state != RenderState::Terminated {
            self.tick(sink);
            match commands.recv_timeout(self.config.poll_interval) {
                Ok(command) => {
                    self.handle(command, sink);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    self.handle(Command::Quit, sink);
                }
            }
        }
    }

    fn on_capture_event(&mut self, event: CaptureEvent, sink: &mut dyn DisplaySink) {
        match event {
            CaptureEvent::Started => sink.show_status(&Status::info("Camera started")),
            CaptureEvent::DeviceUnavailable(reason) => {
                sink.show_status(&Status::error(format!("Camera unavailable: {reason}")))
            }
            CaptureEvent::CaptureFailed(reason) => {
                sink.show_status(&Status::error(format!("Camera stopped: {reason}")))
            }
            CaptureEvent::Stopped => log::debug!("Capture loop stopped"),
        }
    }

    fn capture_mood(&mut self, sink: &mut dyn DisplaySink) {
        let mood = self.mood.current();
        self.captured = Some(mood);
        self.enter(RenderState::MoodResolved, sink);
        sink.show_mood(mood);
        self.dispatch(mood, sink);
    }

    fn dispatch(&mut self, mood: Mood, sink: &mut dyn DisplaySink) {
        if self.pending.is_some() {
            sink.show_status(&Status::info("Still searching..."));
            return;
        }
        log::info!("Resolving media for {mood}");
        self.pending = Some(resolve_worker::spawn(Arc::clone(&self.resolver), mood));
        sink.set_resolving(true);
        sink.show_status(&Status::info(format!(
            "Searching for {} music...",
            mood.emotion
        )));
    }

    fn poll_resolver(&mut self, sink: &mut dyn DisplaySink) {
        let Some(rx) = &self.pending else {
            return;
        };
        let message = match rx.try_recv() {
            Ok(message) => message,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                sink.set_resolving(false);
                sink.show_status(&Status::error("Search stopped unexpectedly"));
                return;
            }
        };
        self.pending = None;
        sink.set_resolving(false);

        match message {
            ResolveMessage::Resolved { mood, media } => {
                log::info!("Resolved {} result(s) for {mood}", media.len());
                sink.show_media(&media);
                sink.show_status(&Status::success(format!(
                    "Found music for {}",
                    mood.emotion
                )));
            }
            ResolveMessage::Failed { mood, error } => {
                log::warn!("Media resolution for {mood} failed: {error}");
                sink.show_status(&Status::error(format!(
                    "No music found for {}: {error}",
                    mood.emotion
                )));
            }
        }
    }

    fn detect_again(&mut self, sink: &mut dyn DisplaySink) {
        if self.pending.take().is_some() {
            sink.set_resolving(false);
        }
        self.captured = None;
        // Redraw the latest frame even if it arrived while frozen.
        self.seen = 0;
        self.enter(RenderState::LiveDetection, sink);
    }

    fn quit(&mut self, sink: &mut dyn DisplaySink) {
        // Closed first so a capture thread that outlives the timeout cannot
        // refill it.
        self.mailbox.close();
        let outcome = self.capture.shutdown(self.config.shutdown_timeout);
        if outcome == ShutdownOutcome::TimedOut {
            sink.show_status(&Status::error("Camera did not stop in time"));
        }
        self.pending = None;
        self.enter(RenderState::Terminated, sink);
        log::info!("Session terminated");
    }

    fn enter(&mut self, state: RenderState, sink: &mut dyn DisplaySink) {
        self.state = state;
        sink.set_state(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::domain::media_resolver::{MediaRef, ResolverError};
    use crate::media::infrastructure::video_search_resolver::{
        VideoSearchConfig, VideoSearchResolver,
    };
    use crate::pipeline::capture_logger::NullCaptureLogger;
    use crate::pipeline::display_sink::StatusLevel;
    use crate::pipeline::session;
    use crate::pipeline::testing::{self, RecordingSink, Shown, Step, StubResolver};
    use crate::shared::emotion::Emotion;
    use std::time::Duration;

    fn start(script: Vec<Step>, resolver: Arc<dyn MediaResolver>) -> RenderLoop {
        let (opener, _) = testing::source(None, Duration::from_millis(1));
        session::start_with_logger(
            opener,
            testing::estimator(script),
            resolver,
            testing::config(),
            Box::new(NullCaptureLogger),
        )
    }

    fn tick_until(
        render: &mut RenderLoop,
        sink: &mut RecordingSink,
        mut done: impl FnMut(&RenderLoop, &RecordingSink) -> bool,
    ) {
        testing::wait_until(|| {
            render.tick(sink);
            done(render, sink)
        });
    }

    fn found() -> Arc<StubResolver> {
        StubResolver::new(Ok(vec![MediaRef::from_video_id("abc12345678")]))
    }

    fn web_resolver(url: String) -> Arc<dyn MediaResolver> {
        Arc::new(VideoSearchResolver::new(VideoSearchConfig {
            base_url: url,
            timeout: Duration::from_secs(5),
            ..VideoSearchConfig::default()
        }))
    }

    #[test]
    fn test_resolver_failure_is_shown_and_mood_kept() {
        let url = testing::serve(503, "/watch?v=abc12345678");
        let mut render = start(vec![Step::Face(Emotion::Sad)], web_resolver(url));
        let mut sink = RecordingSink::default();
        tick_until(&mut render, &mut sink, |r, _| {
            r.current_mood().emotion == Emotion::Sad
        });

        render.handle(Command::Capture, &mut sink);
        tick_until(&mut render, &mut sink, |r, _| !r.is_resolving());

        assert_eq!(
            sink.statuses(StatusLevel::Error),
            vec!["No music found for Sad: search returned HTTP 503"]
        );
        assert!(sink.media().is_none());
        assert_eq!(render.current_mood().emotion, Emotion::Sad);
        assert_eq!(render.state(), RenderState::MoodResolved);

        render.handle(Command::Quit, &mut sink);
    }

    #[test]
    fn test_watch_link_resolves_to_canonical_url() {
        let url = testing::serve(200, r#"<a href="/watch?v=abc12345678">tune</a>"#);
        let mut render = start(vec![Step::Face(Emotion::Happy)], web_resolver(url));
        let mut sink = RecordingSink::default();
        tick_until(&mut render, &mut sink, |r, _| {
            r.current_mood().emotion == Emotion::Happy
        });

        render.handle(Command::Capture, &mut sink);
        tick_until(&mut render, &mut sink, |_, s| s.media().is_some());

        assert_eq!(
            sink.media().unwrap()[0].url,
            "https://www.youtube.com/watch?v=abc12345678"
        );
        assert_eq!(
            sink.statuses(StatusLevel::Success),
            vec!["Found music for Happy"]
        );
        render.handle(Command::Quit, &mut sink);
    }

    #[test]
    fn test_detect_again_twice_is_idempotent() {
        let mut render = start(vec![Step::Face(Emotion::Fear)], found());
        let mut sink = RecordingSink::default();
        tick_until(&mut render, &mut sink, |r, _| {
            r.current_mood().emotion == Emotion::Fear
        });

        render.handle(Command::Capture, &mut sink);
        let mood = render.current_mood();

        assert_eq!(
            render.handle(Command::DetectAgain, &mut sink),
            RenderState::LiveDetection
        );
        assert_eq!(render.current_mood(), mood);
        assert_eq!(render.captured_mood(), None);

        assert_eq!(
            render.handle(Command::DetectAgain, &mut sink),
            RenderState::LiveDetection
        );
        assert_eq!(render.current_mood(), mood);

        render.handle(Command::Quit, &mut sink);
    }

    #[test]
    fn test_capture_freezes_mood_and_live_display() {
        let resolver = found();
        let mut render = start(vec![], resolver.clone());
        let mut sink = RecordingSink::default();
        tick_until(&mut render, &mut sink, |_, s| s.snapshot_count() >= 2);

        assert_eq!(
            render.handle(Command::Capture, &mut sink),
            RenderState::MoodResolved
        );
        assert_eq!(render.captured_mood(), Some(Mood::default()));
        let shown_before = sink.snapshot_count();
        tick_until(&mut render, &mut sink, |_, s| s.media().is_some());
        std::thread::sleep(Duration::from_millis(20));
        render.tick(&mut sink);

        assert_eq!(sink.snapshot_count(), shown_before);
        assert_eq!(resolver.calls(), vec![Mood::default()]);
        assert!(sink.shown.contains(&Shown::Mood(Mood::default())));
        assert!(sink.shown.contains(&Shown::State(RenderState::MoodResolved)));

        render.handle(Command::DetectAgain, &mut sink);
        tick_until(&mut render, &mut sink, |_, s| s.snapshot_count() > shown_before);
        render.handle(Command::Quit, &mut sink);
    }

    #[test]
    fn test_play_retries_with_captured_mood() {
        let resolver = StubResolver::new(Err(ResolverError::NoMatch("Neutral".into())));
        let mut render = start(vec![], resolver.clone());
        let mut sink = RecordingSink::default();

        render.handle(Command::Capture, &mut sink);
        tick_until(&mut render, &mut sink, |r, _| !r.is_resolving());
        render.handle(Command::Play, &mut sink);
        tick_until(&mut render, &mut sink, |r, _| !r.is_resolving());

        assert_eq!(resolver.calls(), vec![Mood::default(), Mood::default()]);
        assert_eq!(sink.statuses(StatusLevel::Error).len(), 2);
        render.handle(Command::Quit, &mut sink);
    }

    #[test]
    fn test_play_while_searching_does_not_start_another() {
        let resolver = StubResolver::slow(Ok(vec![MediaRef::new("x")]), Duration::from_millis(100));
        let mut render = start(vec![], resolver.clone());
        let mut sink = RecordingSink::default();

        render.handle(Command::Capture, &mut sink);
        render.handle(Command::Play, &mut sink);
        assert!(sink.statuses(StatusLevel::Info).contains(&"Still searching...".to_string()));

        tick_until(&mut render, &mut sink, |_, s| s.media().is_some());
        assert_eq!(resolver.calls().len(), 1);
        render.handle(Command::Quit, &mut sink);
    }

    #[test]
    fn test_detect_again_abandons_pending_search() {
        let resolver = StubResolver::slow(Ok(vec![MediaRef::new("x")]), Duration::from_millis(50));
        let mut render = start(vec![], resolver);
        let mut sink = RecordingSink::default();

        render.handle(Command::Capture, &mut sink);
        render.handle(Command::DetectAgain, &mut sink);
        assert!(!render.is_resolving());

        std::thread::sleep(Duration::from_millis(100));
        render.tick(&mut sink);
        assert!(sink.media().is_none());
        render.handle(Command::Quit, &mut sink);
    }

    #[test]
    fn test_device_unavailable_keeps_render_loop_usable() {
        let resolver = found();
        let mut render = session::start_with_logger(
            testing::unavailable_source(),
            testing::estimator(vec![]),
            resolver,
            testing::config(),
            Box::new(NullCaptureLogger),
        );
        let mut sink = RecordingSink::default();
        tick_until(&mut render, &mut sink, |_, s| {
            !s.statuses(StatusLevel::Error).is_empty()
        });

        assert_eq!(
            sink.statuses(StatusLevel::Error),
            vec!["Camera unavailable: no camera at index 3"]
        );
        render.handle(Command::Capture, &mut sink);
        tick_until(&mut render, &mut sink, |_, s| s.media().is_some());
        assert_eq!(
            render.handle(Command::Quit, &mut sink),
            RenderState::Terminated
        );
    }

    #[test]
    fn test_terminated_is_absorbing() {
        let mut render = start(vec![], found());
        let mut sink = RecordingSink::default();

        assert_eq!(render.handle(Command::Quit, &mut sink), RenderState::Terminated);
        let shown = sink.shown.len();
        for command in [Command::Capture, Command::Play, Command::DetectAgain, Command::Quit] {
            assert_eq!(render.handle(command, &mut sink), RenderState::Terminated);
        }
        render.tick(&mut sink);
        assert_eq!(sink.shown.len(), shown);
        assert!(render.mailbox.latest().is_none());
        assert!(render.mailbox.is_closed());
    }

    #[test]
    fn test_quit_after_timeout_keeps_mailbox_empty() {
        let (opener, releases) = testing::source(None, Duration::from_millis(300));
        let mut render = session::start_with_logger(
            opener,
            testing::estimator(vec![]),
            found(),
            SessionConfig {
                shutdown_timeout: Duration::from_millis(20),
                ..testing::config()
            },
            Box::new(NullCaptureLogger),
        );
        let mut sink = RecordingSink::default();
        tick_until(&mut render, &mut sink, |_, s| {
            s.statuses(StatusLevel::Info).contains(&"Camera started".to_string())
        });

        assert_eq!(render.handle(Command::Quit, &mut sink), RenderState::Terminated);
        assert_eq!(
            sink.statuses(StatusLevel::Error),
            vec!["Camera did not stop in time"]
        );

        // The detached thread finishes its read after the quit.
        testing::wait_until(|| releases.load(std::sync::atomic::Ordering::SeqCst) == 1);
        assert!(render.mailbox.latest().is_none());
        assert_eq!(render.mailbox.generation(), 0);
    }

    #[test]
    fn test_run_quits_on_command() {
        let mut render = start(vec![], found());
        let mut sink = RecordingSink::default();
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(Command::Capture).unwrap();
        tx.send(Command::Quit).unwrap();

        render.run(&mut sink, &rx);
        assert_eq!(render.state(), RenderState::Terminated);
        assert!(sink.shown.contains(&Shown::State(RenderState::MoodResolved)));
    }

    #[test]
    fn test_run_quits_when_commands_disconnect() {
        let mut render = start(vec![], found());
        let mut sink = RecordingSink::default();
        let (tx, rx) = crossbeam_channel::unbounded::<Command>();
        drop(tx);

        render.run(&mut sink, &rx);
        assert_eq!(render.state(), RenderState::Terminated);
    }
}
