use iced::widget::{
    button, column, container, image, pick_list, progress_bar, row, text, text_input, Space,
};
use iced::{Color, Element, Length, Theme};

use moodtune_core::pipeline::display_sink::RenderState;
use moodtune_core::shared::emotion::Mood;

use crate::app::{scaled, Message, Startup};
use crate::playlist_state::PlaylistState;
use crate::theme::{emotion_background, emotion_color, status_color};
use crate::view_state::LiveView;

pub fn view<'a>(
    fs: f32,
    startup: &Startup,
    live: &'a LiveView,
    playlists: &'a PlaylistState,
    theme: &Theme,
) -> Element<'a, Message> {
    match startup {
        Startup::Loading { download, .. } => loading_state(fs, *download),
        Startup::Failed(error) => error_state(fs, error),
        Startup::Running(_) => session_view(fs, live, playlists, theme),
    }
}

fn loading_state<'a>(fs: f32, download: Option<(&'static str, u64, u64)>) -> Element<'a, Message> {
    let mut col = column![].spacing(8).align_x(iced::Alignment::Center).width(Length::Fill);

    match download {
        Some((model, downloaded, total)) if total > 0 => {
            let pct = downloaded as f32 / total as f32 * 100.0;
            col = col
                .push(text(format!("Downloading {model}: {pct:.0}%")).size(scaled(15.0, fs)))
                .push(progress_bar(0.0..=100.0, pct));
        }
        Some((model, downloaded, _)) => {
            col = col.push(
                text(format!("Downloading {model}\u{2026} {downloaded} bytes"))
                    .size(scaled(15.0, fs)),
            );
        }
        None => {
            col = col.push(text("Loading models\u{2026}").size(scaled(15.0, fs)));
        }
    }

    container(col)
        .width(Length::Fill)
        .center_x(Length::Fill)
        .padding([48, 40])
        .into()
}

fn error_state<'a>(fs: f32, error: &str) -> Element<'a, Message> {
    container(
        column![
            text("Could not start").size(scaled(18.0, fs)),
            Space::new().height(8),
            text(error.to_owned()).size(scaled(14.0, fs)),
            Space::new().height(20),
            button(text("Try Again").size(scaled(14.0, fs)))
                .on_press(Message::ApplySettings)
                .padding([14, 24]),
        ]
        .align_x(iced::Alignment::Center)
        .width(320),
    )
    .width(Length::Fill)
    .center_x(Length::Fill)
    .padding([48, 0])
    .into()
}

fn session_view<'a>(
    fs: f32,
    live: &'a LiveView,
    playlists: &'a PlaylistState,
    theme: &Theme,
) -> Element<'a, Message> {
    let preview: Element<'a, Message> = match &live.frame {
        Some(handle) => image(handle.clone()).width(Length::Fill).into(),
        None => container(text("Waiting for camera\u{2026}").size(scaled(14.0, fs)))
            .width(Length::Fill)
            .height(240)
            .center_x(Length::Fill)
            .center_y(240)
            .style(container::rounded_box)
            .into(),
    };

    let mood = live.captured.unwrap_or(live.live_mood);
    let heading = match live.state {
        RenderState::LiveDetection if live.face_found => "Live mood",
        RenderState::LiveDetection => "Live mood (no face)",
        _ => "Captured mood",
    };

    let mut col = column![
        preview,
        Space::new().height(12),
        row![
            text(heading).size(scaled(13.0, fs)),
            Space::new().width(Length::Fill),
            text(format!("{:.0} fps", live.fps)).size(scaled(12.0, fs)),
        ],
        Space::new().height(6),
        mood_badge(fs, mood),
        Space::new().height(12),
        controls(fs, live),
    ]
    .spacing(0);

    if let Some(status) = &live.status {
        col = col.push(Space::new().height(12)).push(
            text(status.message.clone())
                .size(scaled(13.0, fs))
                .color(status_color(status.level, theme)),
        );
    }

    if !live.media.is_empty() {
        col = col
            .push(Space::new().height(12))
            .push(text("Results").size(scaled(16.0, fs)))
            .push(Space::new().height(6));
        for (i, media) in live.media.iter().enumerate() {
            let label = media.title.clone().unwrap_or_else(|| media.url.clone());
            col = col.push(
                row![
                    button(text(label).size(scaled(13.0, fs)))
                        .on_press(Message::OpenMedia(media.url.clone()))
                        .style(button::text),
                    Space::new().width(Length::Fill),
                    button(text("Add").size(scaled(12.0, fs)))
                        .on_press(Message::AddToPlaylist(i))
                        .padding([4, 12])
                        .style(button::secondary),
                ]
                .align_y(iced::Alignment::Center),
            );
        }
        col = col
            .push(Space::new().height(10))
            .push(save_controls(fs, playlists));
    }

    col.into()
}

fn save_controls<'a>(fs: f32, playlists: &'a PlaylistState) -> Element<'a, Message> {
    let names = playlists.names();
    let mut controls = row![].spacing(10).align_y(iced::Alignment::Center);
    if !names.is_empty() {
        controls = controls
            .push(text("Save to").size(scaled(13.0, fs)))
            .push(
                pick_list(names, playlists.target.clone(), Message::PlaylistTargetSelected)
                    .text_size(scaled(13.0, fs)),
            );
    }
    controls
        .push(
            text_input("New playlist", &playlists.draft)
                .on_input(Message::PlaylistDraftChanged)
                .on_submit(Message::CreatePlaylist)
                .size(scaled(13.0, fs))
                .width(180),
        )
        .push(
            button(text("Create").size(scaled(13.0, fs)))
                .on_press(Message::CreatePlaylist)
                .padding([6, 14])
                .style(button::secondary),
        )
        .into()
}

fn mood_badge<'a>(fs: f32, mood: Mood) -> Element<'a, Message> {
    let fg = emotion_color(mood.emotion);
    let bg = emotion_background(mood.emotion);
    let fill = mood.emotion.fill_percentage() as f32;

    let badge = container(
        row![
            text(mood.emotion.emoji()).size(scaled(24.0, fs)),
            column![
                text(mood.emotion.label()).size(scaled(17.0, fs)).color(fg),
                text(format!("Level {}", mood.level)).size(scaled(12.0, fs)).color(fg),
            ],
            Space::new().width(Length::Fill),
            container(progress_bar(0.0..=100.0, fill)).width(120),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
    )
    .padding([10, 14])
    .width(Length::Fill)
    .style(move |_theme: &Theme| container::Style {
        background: Some(iced::Background::Color(Color { a: 0.9, ..bg })),
        border: iced::border::Border {
            radius: 10.0.into(),
            ..iced::border::Border::default()
        },
        ..container::Style::default()
    });

    badge.into()
}

fn controls<'a>(fs: f32, live: &LiveView) -> Element<'a, Message> {
    match live.state {
        RenderState::LiveDetection => row![button(text("Capture Mood").size(scaled(15.0, fs)))
            .on_press(Message::Capture)
            .padding([12, 24])
            .width(Length::Fill)]
        .into(),
        RenderState::MoodResolved => {
            let play_label = if live.resolving {
                "Searching\u{2026}"
            } else {
                "Play"
            };
            let mut play = button(text(play_label).size(scaled(15.0, fs)))
                .padding([12, 24])
                .width(Length::Fill);
            if !live.resolving {
                play = play.on_press(Message::Play);
            }
            row![
                play,
                button(text("Detect Again").size(scaled(14.0, fs)))
                    .on_press(Message::DetectAgain)
                    .padding([12, 20])
                    .style(button::secondary),
            ]
            .spacing(10)
            .into()
        }
        RenderState::Terminated => text("Session ended").size(scaled(14.0, fs)).into(),
    }
}
