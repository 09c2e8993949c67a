use iced::color;
use iced::theme::Palette;
use iced::{Color, Theme};

use moodtune_core::pipeline::display_sink::StatusLevel;
use moodtune_core::shared::emotion::Emotion;

use crate::settings::Appearance;

pub fn resolve_theme(appearance: Appearance) -> Theme {
    let is_dark = match appearance {
        Appearance::Dark => true,
        Appearance::Light => false,
        Appearance::System => detect_system_dark_mode(),
    };

    let palette = if is_dark {
        dark_palette()
    } else {
        light_palette()
    };
    Theme::custom("MoodTune", palette)
}

fn dark_palette() -> Palette {
    Palette {
        background: color!(0x1c, 0x1c, 0x1e),
        text: color!(0xcc, 0xcc, 0xcc),
        primary: color!(0xb3, 0x88, 0xeb),
        success: color!(0x30, 0xd1, 0x58),
        warning: color!(0xff, 0xcc, 0x00),
        danger: color!(0xff, 0x45, 0x3a),
    }
}

fn light_palette() -> Palette {
    Palette {
        background: color!(0xfa, 0xf7, 0xff),
        text: color!(0x1d, 0x1d, 0x1f),
        primary: color!(0x7b, 0x4f, 0xc4),
        success: color!(0x34, 0xc7, 0x59),
        warning: color!(0xff, 0x9f, 0x0a),
        danger: color!(0xff, 0x3b, 0x30),
    }
}

/// Foreground colour for an emotion badge.
pub fn emotion_color(emotion: Emotion) -> Color {
    rgb_hex(emotion.colors().0)
}

/// Background colour for an emotion badge.
pub fn emotion_background(emotion: Emotion) -> Color {
    rgb_hex(emotion.colors().1)
}

pub fn status_color(level: StatusLevel, theme: &Theme) -> Color {
    let palette = theme.palette();
    match level {
        StatusLevel::Info => palette.text,
        StatusLevel::Success => palette.success,
        StatusLevel::Error => palette.danger,
    }
}

fn rgb_hex(rgb: u32) -> Color {
    Color::from_rgb8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

fn detect_system_dark_mode() -> bool {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("defaults")
            .args(["read", "-g", "AppleInterfaceStyle"])
            .output()
            .map(|o| {
                String::from_utf8_lossy(&o.stdout)
                    .trim()
                    .eq_ignore_ascii_case("dark")
            })
            .unwrap_or(true)
    }
    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}
