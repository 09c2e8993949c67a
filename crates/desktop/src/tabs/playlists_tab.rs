use iced::widget::{button, column, row, text, Space};
use iced::{Element, Length, Theme};

use moodtune_core::media::domain::playlists::Playlists;
use moodtune_core::pipeline::display_sink::Status;

use crate::app::{scaled, Message};
use crate::theme::{emotion_color, status_color};

pub fn view<'a>(
    fs: f32,
    playlists: &'a Playlists,
    status: Option<&'a Status>,
    theme: &Theme,
) -> Element<'a, Message> {
    let mut col = column![].spacing(0);

    if let Some(status) = status {
        col = col
            .push(
                text(status.message.clone())
                    .size(scaled(13.0, fs))
                    .color(status_color(status.level, theme)),
            )
            .push(Space::new().height(12));
    }

    if playlists.is_empty() {
        return col
            .push(
                text("No playlists yet. Save a result from the Live tab to start one.")
                    .size(scaled(13.0, fs)),
            )
            .into();
    }

    for name in playlists.names() {
        let songs = playlists.songs(name).unwrap_or_default();
        col = col.push(
            row![
                text(name.to_owned()).size(scaled(16.0, fs)),
                text(format!("{} songs", songs.len())).size(scaled(12.0, fs)),
                Space::new().width(Length::Fill),
                button(text("Play").size(scaled(13.0, fs)))
                    .on_press(Message::PlayPlaylist(name.to_owned()))
                    .padding([6, 14]),
                button(text("Delete").size(scaled(13.0, fs)))
                    .on_press(Message::DeletePlaylist(name.to_owned()))
                    .padding([6, 14])
                    .style(button::danger),
            ]
            .spacing(10)
            .align_y(iced::Alignment::Center),
        );

        for (i, entry) in songs.iter().enumerate() {
            col = col.push(
                row![
                    button(text(format!("{}. {}", i + 1, entry.name())).size(scaled(13.0, fs)))
                        .on_press(Message::OpenMedia(entry.media.url.clone()))
                        .style(button::text),
                    text(entry.mood.emotion.label())
                        .size(scaled(12.0, fs))
                        .color(emotion_color(entry.mood.emotion)),
                    Space::new().width(Length::Fill),
                    button(text("Remove").size(scaled(12.0, fs)))
                        .on_press(Message::RemoveFromPlaylist(name.to_owned(), i))
                        .style(button::text),
                ]
                .spacing(8)
                .align_y(iced::Alignment::Center),
            );
        }
        col = col.push(Space::new().height(16));
    }

    col.into()
}
