use iced::widget::{button, checkbox, column, pick_list, row, slider, text, Space};
use iced::Element;

use moodtune_core::detection::domain::face_selection::FaceSelection;
use moodtune_core::detection::infrastructure::onnx_emotion_classifier::LabelLayout;

use crate::app::{scaled, Message};
use crate::settings::{Appearance, Settings};

const CAMERA_CHOICES: [u32; 4] = [0, 1, 2, 3];

pub fn view<'a>(settings: &Settings, restart_pending: bool) -> Element<'a, Message> {
    let fs = settings.font_scale;

    let song_source = match &settings.song_table {
        Some(path) => path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string()),
        None => "Web search".to_string(),
    };

    let mut song_row = row![
        text(song_source).size(scaled(13.0, fs)),
        button(text("Choose\u{2026}").size(scaled(13.0, fs)))
            .on_press(Message::SelectSongTable)
            .padding([6, 14])
            .style(button::secondary),
    ]
    .spacing(12)
    .align_y(iced::Alignment::Center);
    if settings.song_table.is_some() {
        song_row = song_row.push(
            button(text("Use web search").size(scaled(13.0, fs)))
                .on_press(Message::ClearSongTable)
                .padding([6, 14])
                .style(button::text),
        );
    }

    let mut col = column![
        text("Camera").size(scaled(16.0, fs)),
        Space::new().height(8),
        row![
            text("Device").size(scaled(13.0, fs)),
            pick_list(CAMERA_CHOICES, Some(settings.camera_index), Message::CameraIndexChanged)
                .text_size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(8),
        checkbox(settings.show_overlay)
            .label("Outline the detected face")
            .on_toggle(Message::ShowOverlayChanged)
            .text_size(scaled(13.0, fs)),
        Space::new().height(20),
        text("Detection").size(scaled(16.0, fs)),
        Space::new().height(8),
        row![
            text("Face").size(scaled(13.0, fs)),
            pick_list(FaceSelection::ALL, Some(settings.face_selection), |s| {
                Message::FaceSelectionChanged(s)
            })
            .text_size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(8),
        row![
            text("Emotion model").size(scaled(13.0, fs)),
            pick_list(LabelLayout::ALL, Some(settings.label_layout), |l| {
                Message::LabelLayoutChanged(l)
            })
            .text_size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(8),
        row![
            text("Confidence").size(scaled(13.0, fs)),
            slider(5..=95, settings.confidence, Message::ConfidenceChanged),
            text(format!("{}%", settings.confidence)).size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(20),
        text("Music").size(scaled(16.0, fs)),
        Space::new().height(8),
        song_row,
        Space::new().height(8),
        row![
            text("Results").size(scaled(13.0, fs)),
            slider(1..=20, settings.max_results, Message::MaxResultsChanged),
            text(settings.max_results.to_string()).size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(8),
        checkbox(settings.open_in_browser)
            .label("Open the first result in the browser")
            .on_toggle(Message::OpenInBrowserChanged)
            .text_size(scaled(13.0, fs)),
        Space::new().height(20),
        text("Appearance").size(scaled(16.0, fs)),
        Space::new().height(8),
        row![
            text("Theme").size(scaled(13.0, fs)),
            pick_list(Appearance::ALL, Some(settings.appearance), Message::AppearanceChanged)
                .text_size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(8),
        row![
            text("Text size").size(scaled(13.0, fs)),
            slider(0.8..=1.5, settings.font_scale, Message::FontScaleChanged).step(0.05),
            text(format!("{:.0}%", settings.font_scale * 100.0)).size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(20),
    ]
    .spacing(0);

    let mut actions = row![button(text("Restore Defaults").size(scaled(13.0, fs)))
        .on_press(Message::RestoreDefaults)
        .padding([8, 16])
        .style(button::secondary)]
    .spacing(10);
    if restart_pending {
        actions = actions.push(
            button(text("Apply and Restart").size(scaled(13.0, fs)))
                .on_press(Message::ApplySettings)
                .padding([8, 16]),
        );
    }
    col = col.push(actions);

    col.into()
}
