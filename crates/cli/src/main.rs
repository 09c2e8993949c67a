use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use moodtune_core::capture::domain::frame_source::FrameSourceOpener;
use moodtune_core::capture::infrastructure::camera_frame_source::CameraFrameSource;
use moodtune_core::capture::infrastructure::video_file_frame_source::VideoFileFrameSource;
use moodtune_core::detection::domain::emotion_estimator::EmotionEstimator;
use moodtune_core::detection::domain::face_emotion_estimator::FaceEmotionEstimator;
use moodtune_core::detection::domain::face_selection::FaceSelection;
use moodtune_core::detection::infrastructure::onnx_emotion_classifier::{
    LabelLayout, OnnxEmotionClassifier,
};
use moodtune_core::detection::infrastructure::onnx_face_detector::{
    OnnxFaceDetector, DEFAULT_CONFIDENCE,
};
use moodtune_core::media::domain::media_resolver::{MediaRef, MediaResolver};
use moodtune_core::media::infrastructure::song_table::SongTable;
use moodtune_core::media::infrastructure::video_search_resolver::{
    VideoSearchConfig, VideoSearchResolver,
};
use moodtune_core::pipeline::display_sink::{DisplaySink, RenderState, Status, StatusLevel};
use moodtune_core::pipeline::render_loop::{Command, RenderLoop};
use moodtune_core::pipeline::session::{self, SessionConfig};
use moodtune_core::pipeline::snapshot::Snapshot;
use moodtune_core::shared::constants::{
    DEFAULT_CAMERA_INDEX, DEFAULT_MAX_RESULTS, DEFAULT_QUERY_SUFFIX, EMOTION_MODEL_NAME,
    EMOTION_MODEL_URL, FACE_MODEL_NAME, FACE_MODEL_URL, VIDEO_SEARCH_URL,
};
use moodtune_core::shared::emotion::Mood;
use moodtune_core::shared::model_resolver;

mod playlist_shell;

use playlist_shell::{PlaylistCommand, PlaylistShell};

/// Live facial-emotion detection that finds music for your mood.
#[derive(Parser)]
#[command(name = "moodtune")]
struct Cli {
    /// Camera device index.
    #[arg(long, default_value_t = DEFAULT_CAMERA_INDEX)]
    camera: u32,

    /// Replay a video file instead of reading the camera.
    #[arg(long)]
    video: Option<PathBuf>,

    /// Face detection model (downloaded to the cache when omitted).
    #[arg(long)]
    face_model: Option<PathBuf>,

    /// Emotion classification model (downloaded to the cache when omitted).
    #[arg(long)]
    emotion_model: Option<PathBuf>,

    /// Output layout of the emotion model: ferplus or fer2013.
    #[arg(long, default_value = "ferplus")]
    label_layout: LabelLayout,

    /// Which face to read when several are found: first, largest,
    /// most-central or most-confident.
    #[arg(long, default_value = "first")]
    face_selection: FaceSelection,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// CSV song table (Song Title, Emotion, level_of_emotion, YouTube Link)
    /// to recommend from instead of searching the web.
    #[arg(long)]
    songs: Option<PathBuf>,

    /// Maximum number of results to show.
    #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
    max_results: usize,

    /// Video search endpoint.
    #[arg(long, default_value = VIDEO_SEARCH_URL)]
    search_url: String,

    /// Words appended to the emotion in the search query.
    #[arg(long, default_value = DEFAULT_QUERY_SUFFIX)]
    query_suffix: String,

    /// Search request timeout in seconds.
    #[arg(long, default_value = "10")]
    timeout: u64,

    /// How long to wait for the camera to stop on quit, in milliseconds.
    #[arg(long, default_value = "2000")]
    shutdown_timeout_ms: u64,

    /// Open the first result in the default browser.
    #[arg(long)]
    open: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let estimator = build_estimator(&cli)?;
    let resolver = build_resolver(&cli)?;
    let opener = build_opener(&cli);
    let config = SessionConfig {
        shutdown_timeout: Duration::from_millis(cli.shutdown_timeout_ms),
        ..SessionConfig::default()
    };

    let mut render = session::start(opener, estimator, resolver, config);
    let (tx, rx) = crossbeam_channel::unbounded();
    spawn_command_reader(tx);

    println!("Commands: [c]apture, [p]lay, [d]etect again, [q]uit");
    println!("{}", playlist_shell::HELP);
    let mut sink = TerminalSink::new(cli.open);
    drive(&mut render, &mut sink, &rx);
    Ok(())
}

/// The render loop's own polling, with playlist commands answered in
/// between.
fn drive(render: &mut RenderLoop, sink: &mut TerminalSink, inputs: &Receiver<Input>) {
    while render.state() != RenderState::Terminated {
        render.tick(sink);
        match inputs.recv_timeout(render.config().poll_interval) {
            Ok(Input::Session(command)) => {
                render.handle(command, sink);
            }
            Ok(Input::Playlist(command)) => sink.playlist(command),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                render.handle(Command::Quit, sink);
            }
        }
    }
}

fn build_estimator(cli: &Cli) -> Result<Box<dyn EmotionEstimator>, Box<dyn std::error::Error>> {
    let face_path = resolve_model(cli.face_model.as_deref(), FACE_MODEL_NAME, FACE_MODEL_URL)?;
    let emotion_path = resolve_model(
        cli.emotion_model.as_deref(),
        EMOTION_MODEL_NAME,
        EMOTION_MODEL_URL,
    )?;

    let detector = OnnxFaceDetector::new(&face_path, cli.confidence)?;
    let classifier = OnnxEmotionClassifier::new(&emotion_path, cli.label_layout)?;
    log::info!("Face selection: {}", cli.face_selection);

    Ok(Box::new(FaceEmotionEstimator::new(
        Box::new(detector),
        Box::new(classifier),
        cli.face_selection,
    )))
}

fn build_resolver(cli: &Cli) -> Result<Arc<dyn MediaResolver>, Box<dyn std::error::Error>> {
    if let Some(path) = &cli.songs {
        let table = SongTable::load(path)?.with_recommendations(cli.max_results);
        return Ok(Arc::new(table));
    }
    Ok(Arc::new(VideoSearchResolver::new(VideoSearchConfig {
        base_url: cli.search_url.clone(),
        query_suffix: cli.query_suffix.clone(),
        max_results: cli.max_results,
        timeout: Duration::from_secs(cli.timeout),
    })))
}

fn build_opener(cli: &Cli) -> Box<dyn FrameSourceOpener> {
    match &cli.video {
        Some(path) => VideoFileFrameSource::opener(path.clone(), true),
        None => CameraFrameSource::opener(cli.camera),
    }
}

fn resolve_model(
    explicit: Option<&Path>,
    name: &str,
    url: &str,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    log::info!("Resolving model: {name}");
    let path = model_resolver::resolve(name, url, None, Some(Box::new(download_progress)))?;
    Ok(path)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if cli.max_results == 0 {
        return Err("Max results must be at least 1".into());
    }
    if cli.timeout == 0 {
        return Err("Timeout must be at least 1 second".into());
    }
    let files = [
        ("Video file", &cli.video),
        ("Face model", &cli.face_model),
        ("Emotion model", &cli.emotion_model),
        ("Song table", &cli.songs),
    ];
    for (label, path) in files {
        if let Some(path) = path {
            if !path.exists() {
                return Err(format!("{label} not found: {}", path.display()).into());
            }
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Session(Command),
    Playlist(PlaylistCommand),
}

/// Forward stdin lines as commands. EOF drops the sender, which the
/// render loop treats as quit.
fn spawn_command_reader(tx: Sender<Input>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_input(&line) {
                Some(input) => {
                    let quit = input == Input::Session(Command::Quit);
                    if tx.send(input).is_err() || quit {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => eprintln!("Unknown command '{}'", line.trim()),
            }
        }
    });
}

fn parse_input(line: &str) -> Option<Input> {
    parse_command(line)
        .map(Input::Session)
        .or_else(|| playlist_shell::parse(line).map(Input::Playlist))
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "c" | "capture" => Some(Command::Capture),
        "p" | "play" => Some(Command::Play),
        "d" | "detect" | "again" => Some(Command::DetectAgain),
        "q" | "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}

/// Prints mood changes, results and statuses to the terminal.
struct TerminalSink {
    open_browser: bool,
    last_mood: Option<Mood>,
    captured: Option<Mood>,
    playlists: PlaylistShell,
}

impl TerminalSink {
    fn new(open_browser: bool) -> Self {
        Self {
            open_browser,
            last_mood: None,
            captured: None,
            playlists: PlaylistShell::new(),
        }
    }

    fn playlist(&mut self, command: PlaylistCommand) {
        match self.playlists.apply(command) {
            Ok(reply) => {
                for line in &reply.lines {
                    println!("{line}");
                }
                if let Some(url) = reply.open.filter(|_| self.open_browser) {
                    open_url(&url);
                }
            }
            Err(e) => eprintln!("{e}"),
        }
    }
}

fn open_url(url: &str) {
    if let Err(e) = open::that(url) {
        log::warn!("Could not open browser: {e}");
    }
}

impl DisplaySink for TerminalSink {
    fn show_snapshot(&mut self, snapshot: &Snapshot) {
        let mood = snapshot.detection.mood;
        log::debug!(
            "frame {} face={} {mood} ({:.1} fps)",
            snapshot.frame.index(),
            snapshot.detection.face.is_some(),
            snapshot.fps
        );
        if self.last_mood.map(|m| m.emotion) != Some(mood.emotion) {
            println!("{} {mood}", mood.emotion.emoji());
            self.last_mood = Some(mood);
        }
    }

    fn show_mood(&mut self, mood: Mood) {
        self.captured = Some(mood);
        println!(
            "Captured mood: {} {mood} [{}%]",
            mood.emotion.emoji(),
            mood.emotion.fill_percentage()
        );
    }

    fn show_media(&mut self, media: &[MediaRef]) {
        for (i, item) in media.iter().enumerate() {
            println!("  {}. {item}", i + 1);
        }
        if let Some(mood) = self.captured {
            self.playlists.set_results(mood, media);
        }
        if self.open_browser {
            if let Some(primary) = media.first() {
                open_url(&primary.url);
            }
        }
    }

    fn show_status(&mut self, status: &Status) {
        match status.level {
            StatusLevel::Info | StatusLevel::Success => println!("{status}"),
            StatusLevel::Error => eprintln!("{status}"),
        }
    }

    fn set_resolving(&mut self, resolving: bool) {
        log::debug!("resolving={resolving}");
    }

    fn set_state(&mut self, state: RenderState) {
        match state {
            RenderState::LiveDetection => {
                self.last_mood = None;
                println!("Live detection");
            }
            RenderState::MoodResolved => {}
            RenderState::Terminated => println!("Bye"),
        }
    }
}
