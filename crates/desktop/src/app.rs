use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, TryRecvError};
use iced::widget::{button, column, container, row, scrollable, text};
use iced::{window, Element, Length, Subscription, Task, Theme};

use moodtune_core::capture::infrastructure::camera_frame_source::CameraFrameSource;
use moodtune_core::detection::domain::emotion_estimator::EmotionEstimator;
use moodtune_core::detection::domain::face_selection::FaceSelection;
use moodtune_core::detection::infrastructure::onnx_emotion_classifier::LabelLayout;
use moodtune_core::media::domain::media_resolver::MediaResolver;
use moodtune_core::media::infrastructure::song_table::SongTable;
use moodtune_core::media::infrastructure::video_search_resolver::{
    VideoSearchConfig, VideoSearchResolver,
};
use moodtune_core::pipeline::display_sink::{DisplaySink, Status};
use moodtune_core::pipeline::render_loop::{Command, RenderLoop};
use moodtune_core::pipeline::session::{self, SessionConfig};

use crate::playlist_state::PlaylistState;
use crate::settings::{Appearance, Settings};
use crate::tabs;
use crate::theme;
use crate::view_state::LiveView;
use crate::workers::startup_worker::{self, EstimatorOptions, StartupMessage};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Live,
    Playlists,
    Settings,
    About,
}

impl Tab {
    const ALL: &[Tab] = &[Tab::Live, Tab::Playlists, Tab::Settings, Tab::About];

    fn label(self) -> &'static str {
        match self {
            Tab::Live => "Live",
            Tab::Playlists => "Playlists",
            Tab::Settings => "Settings",
            Tab::About => "About",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    TabSelected(Tab),
    Tick,
    Capture,
    Play,
    DetectAgain,
    OpenMedia(String),
    AddToPlaylist(usize),
    PlaylistDraftChanged(String),
    PlaylistTargetSelected(String),
    CreatePlaylist,
    PlayPlaylist(String),
    RemoveFromPlaylist(String, usize),
    DeletePlaylist(String),
    CameraIndexChanged(u32),
    FaceSelectionChanged(FaceSelection),
    LabelLayoutChanged(LabelLayout),
    ConfidenceChanged(u32),
    MaxResultsChanged(u32),
    SelectSongTable,
    SongTableSelected(Option<PathBuf>),
    ClearSongTable,
    OpenInBrowserChanged(bool),
    ShowOverlayChanged(bool),
    ApplySettings,
    RestoreDefaults,
    AppearanceChanged(Appearance),
    FontScaleChanged(f32),
    PollSystemTheme,
    CloseRequested,
}

/// Where the app is in bringing up a session.
pub enum Startup {
    Loading {
        rx: Receiver<StartupMessage>,
        download: Option<(&'static str, u64, u64)>,
    },
    Running(RenderLoop),
    Failed(String),
}

pub struct App {
    active_tab: Tab,
    pub settings: Settings,
    /// Settings the current session was started with.
    session_settings: Settings,
    pub startup: Startup,
    pub live: LiveView,
    pub playlists: PlaylistState,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();
        (
            Self {
                active_tab: Tab::Live,
                startup: begin_startup(&settings),
                live: LiveView::new(settings.show_overlay, settings.open_in_browser),
                playlists: PlaylistState::default(),
                session_settings: settings.clone(),
                settings,
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TabSelected(tab) => {
                self.active_tab = tab;
            }
            Message::Tick => self.tick(),
            Message::Capture => self.command(Command::Capture),
            Message::Play => self.command(Command::Play),
            Message::DetectAgain => self.command(Command::DetectAgain),
            Message::OpenMedia(url) => open_media(&url),
            Message::AddToPlaylist(index) => {
                if let Some(status) = self.playlists.add(&self.live, index) {
                    self.live.show_status(&status);
                }
            }
            Message::PlaylistDraftChanged(draft) => {
                self.playlists.draft = draft;
            }
            Message::PlaylistTargetSelected(name) => {
                self.playlists.target = Some(name);
            }
            Message::CreatePlaylist => {
                let status = self.playlists.create(&self.live);
                self.live.show_status(&status);
            }
            Message::PlayPlaylist(name) => {
                let (status, first) = self.playlists.play(&name);
                self.live.show_status(&status);
                if let Some(url) = first {
                    open_media(&url);
                }
            }
            Message::RemoveFromPlaylist(name, index) => {
                let status = self.playlists.remove(&name, index);
                self.live.show_status(&status);
            }
            Message::DeletePlaylist(name) => {
                let status = self.playlists.delete(&name);
                self.live.show_status(&status);
            }
            Message::CameraIndexChanged(index) => {
                self.settings.camera_index = index;
                self.settings.save();
            }
            Message::FaceSelectionChanged(selection) => {
                self.settings.face_selection = selection;
                self.settings.save();
            }
            Message::LabelLayoutChanged(layout) => {
                self.settings.label_layout = layout;
                self.settings.save();
            }
            Message::ConfidenceChanged(val) => {
                self.settings.confidence = val;
                self.settings.save();
            }
            Message::MaxResultsChanged(val) => {
                self.settings.max_results = val.max(1);
                self.settings.save();
            }
            Message::SelectSongTable => {
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .set_title("Select song table")
                            .add_filter("Song table", &["csv"])
                            .pick_file()
                            .await
                            .map(|h| h.path().to_path_buf())
                    },
                    Message::SongTableSelected,
                );
            }
            Message::SongTableSelected(Some(path)) => {
                self.settings.song_table = Some(path);
                self.settings.save();
            }
            Message::SongTableSelected(None) => {}
            Message::ClearSongTable => {
                self.settings.song_table = None;
                self.settings.save();
            }
            Message::OpenInBrowserChanged(enabled) => {
                self.settings.open_in_browser = enabled;
                self.live.open_in_browser = enabled;
                self.settings.save();
            }
            Message::ShowOverlayChanged(enabled) => {
                self.settings.show_overlay = enabled;
                self.live.show_overlay = enabled;
                self.settings.save();
            }
            Message::ApplySettings => self.restart(),
            Message::RestoreDefaults => {
                let defaults = Settings::default();
                self.settings = Settings {
                    appearance: self.settings.appearance,
                    font_scale: self.settings.font_scale,
                    ..defaults
                };
                self.live.show_overlay = self.settings.show_overlay;
                self.live.open_in_browser = self.settings.open_in_browser;
                self.settings.save();
            }
            Message::AppearanceChanged(appearance) => {
                self.settings.appearance = appearance;
                self.settings.save();
            }
            Message::FontScaleChanged(scale) => {
                self.settings.font_scale = scale;
                self.settings.save();
            }
            Message::PollSystemTheme => {
                // Theme is resolved fresh in theme() on every render.
            }
            Message::CloseRequested => {
                self.stop_session();
                return iced::exit();
            }
        }
        Task::none()
    }

    /// Whether saved settings differ from the running session's.
    pub fn restart_pending(&self) -> bool {
        self.session_settings.needs_restart(&self.settings)
    }

    fn tick(&mut self) {
        let mut ready = None;
        if let Startup::Loading { rx, download } = &mut self.startup {
            loop {
                match rx.try_recv() {
                    Ok(StartupMessage::Downloading {
                        model,
                        downloaded,
                        total,
                    }) => *download = Some((model, downloaded, total)),
                    Ok(StartupMessage::Ready(estimator)) => {
                        ready = Some(Ok(estimator));
                        break;
                    }
                    Ok(StartupMessage::Failed(e)) => {
                        ready = Some(Err(e));
                        break;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        ready = Some(Err("Model loading stopped unexpectedly".to_string()));
                        break;
                    }
                }
            }
        }

        match ready {
            Some(Ok(estimator)) => self.start_session(estimator),
            Some(Err(e)) => self.startup = Startup::Failed(e),
            None => {}
        }

        if let Startup::Running(render) = &mut self.startup {
            render.tick(&mut self.live);
        }
    }

    fn command(&mut self, command: Command) {
        if let Startup::Running(render) = &mut self.startup {
            render.handle(command, &mut self.live);
        }
    }

    fn start_session(&mut self, estimator: Box<dyn EmotionEstimator>) {
        let resolver = build_resolver(&self.settings, &mut self.live);
        let opener = CameraFrameSource::opener(self.settings.camera_index);
        let render = session::start(opener, estimator, resolver, SessionConfig::default());
        self.startup = Startup::Running(render);
    }

    fn stop_session(&mut self) {
        if let Startup::Running(render) = &mut self.startup {
            render.handle(Command::Quit, &mut self.live);
        }
    }

    fn restart(&mut self) {
        log::info!("Restarting session with new settings");
        self.stop_session();
        self.live = LiveView::new(self.settings.show_overlay, self.settings.open_in_browser);
        self.session_settings = self.settings.clone();
        self.startup = begin_startup(&self.settings);
    }

    pub fn view(&self) -> Element<'_, Message> {
        let fs = self.settings.font_scale;

        let tab_bar = row(Tab::ALL
            .iter()
            .map(|&tab| {
                let label = text(tab.label()).size(scaled(13.0, fs));
                let btn = button(label)
                    .on_press(Message::TabSelected(tab))
                    .padding([6, 14]);
                if tab == self.active_tab {
                    btn.style(button::primary).into()
                } else {
                    btn.style(button::text).into()
                }
            })
            .collect::<Vec<_>>())
        .spacing(2);

        let theme = self.theme();
        let content: Element<'_, Message> = match self.active_tab {
            Tab::Live => {
                tabs::live_tab::view(fs, &self.startup, &self.live, &self.playlists, &theme)
            }
            Tab::Playlists => tabs::playlists_tab::view(
                fs,
                &self.playlists.playlists,
                self.live.status.as_ref(),
                &theme,
            ),
            Tab::Settings => tabs::settings_tab::view(&self.settings, self.restart_pending()),
            Tab::About => tabs::about_tab::view(fs),
        };

        let tab_content = container(scrollable(content).height(Length::Fill))
            .padding(16)
            .height(Length::Fill);

        column![tab_bar, tab_content]
            .spacing(0)
            .height(Length::Fill)
            .into()
    }

    pub fn theme(&self) -> Theme {
        theme::resolve_theme(self.settings.appearance)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let frames = iced::time::every(FRAME_INTERVAL).map(|_| Message::Tick);
        let close = window::close_requests().map(|_| Message::CloseRequested);
        let system_theme = if self.settings.appearance == Appearance::System {
            iced::time::every(Duration::from_secs(2)).map(|_| Message::PollSystemTheme)
        } else {
            Subscription::none()
        };
        Subscription::batch([frames, close, system_theme])
    }
}

fn begin_startup(settings: &Settings) -> Startup {
    Startup::Loading {
        rx: startup_worker::spawn(estimator_options(settings)),
        download: None,
    }
}

fn estimator_options(settings: &Settings) -> EstimatorOptions {
    EstimatorOptions {
        face_selection: settings.face_selection,
        label_layout: settings.label_layout,
        confidence: settings.confidence as f64 / 100.0,
    }
}

/// Song table when one is configured and loads, web search otherwise.
fn build_resolver(settings: &Settings, sink: &mut dyn DisplaySink) -> Arc<dyn MediaResolver> {
    let max_results = settings.max_results.max(1) as usize;
    if let Some(path) = &settings.song_table {
        match SongTable::load(path) {
            Ok(table) => {
                log::info!("Recommending from {} ({} songs)", path.display(), table.len());
                return Arc::new(table.with_recommendations(max_results));
            }
            Err(e) => {
                log::warn!("{e}");
                sink.show_status(&Status::error(format!(
                    "Song table unavailable, searching the web instead: {e}"
                )));
            }
        }
    }
    Arc::new(VideoSearchResolver::new(VideoSearchConfig {
        max_results,
        ..VideoSearchConfig::default()
    }))
}

fn open_media(url: &str) {
    if let Err(e) = open::that(url) {
        log::warn!("Could not open {url}: {e}");
    }
}

/// Scale a base font size by the user's font_scale setting.
pub fn scaled(base: f32, font_scale: f32) -> f32 {
    (base * font_scale).round()
}
