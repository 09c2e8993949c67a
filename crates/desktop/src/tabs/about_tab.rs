use iced::widget::{column, text, Space};
use iced::Element;

use crate::app::{scaled, Message};

pub fn view(fs: f32) -> Element<'static, Message> {
    let version = env!("CARGO_PKG_VERSION");

    column![
        text("MoodTune").size(scaled(22.0, fs)),
        Space::new().height(4),
        text(format!("Version {version}")).size(scaled(13.0, fs)),
        Space::new().height(12),
        text(
            "Reads your facial expression from the camera and finds music \
             to match. Frames never leave this computer; only the detected \
             emotion is sent to the search service."
        )
        .size(scaled(13.0, fs)),
        Space::new().height(12),
        text("Press Capture Mood to freeze the current emotion, then Play to search again or Detect Again to go back to the live view.")
            .size(scaled(13.0, fs)),
    ]
    .spacing(0)
    .into()
}
