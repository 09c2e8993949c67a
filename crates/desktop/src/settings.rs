use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use moodtune_core::detection::domain::face_selection::FaceSelection;
use moodtune_core::detection::infrastructure::onnx_emotion_classifier::LabelLayout;
use moodtune_core::shared::constants::{DEFAULT_CAMERA_INDEX, DEFAULT_MAX_RESULTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    System,
    Dark,
    Light,
}

impl Appearance {
    pub const ALL: &[Appearance] = &[Appearance::System, Appearance::Dark, Appearance::Light];
}

impl std::fmt::Display for Appearance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Appearance::System => write!(f, "System"),
            Appearance::Dark => write!(f, "Dark"),
            Appearance::Light => write!(f, "Light"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub camera_index: u32,
    pub face_selection: FaceSelection,
    pub label_layout: LabelLayout,
    /// Face detection threshold in percent.
    pub confidence: u32,
    pub max_results: u32,
    /// Recommend from this JSON table instead of searching the web.
    pub song_table: Option<PathBuf>,
    pub open_in_browser: bool,
    pub show_overlay: bool,
    pub appearance: Appearance,
    pub font_scale: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera_index: DEFAULT_CAMERA_INDEX,
            face_selection: FaceSelection::default(),
            label_layout: LabelLayout::default(),
            confidence: 25,
            max_results: DEFAULT_MAX_RESULTS as u32,
            song_table: None,
            open_in_browser: false,
            show_overlay: true,
            appearance: Appearance::System,
            font_scale: 1.0,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("MoodTune").join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            self.save_to(&path);
        }
    }

    /// Missing or unreadable files fall back to defaults.
    fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, json) {
                    log::warn!("Could not save settings to {}: {e}", path.display());
                }
            }
            Err(e) => log::warn!("Could not serialize settings: {e}"),
        }
    }

    /// Whether switching from `self` to `other` needs a new session.
    pub fn needs_restart(&self, other: &Settings) -> bool {
        self.camera_index != other.camera_index
            || self.face_selection != other.face_selection
            || self.label_layout != other.label_layout
            || self.confidence != other.confidence
            || self.max_results != other.max_results
            || self.song_table != other.song_table
    }
}
