use moodtune_core::media::domain::playlists::{PlaylistEntry, Playlists};
use moodtune_core::pipeline::display_sink::Status;

use crate::view_state::LiveView;

/// Playlists plus the name being typed and the playlist results go to.
/// Outlives session restarts.
#[derive(Default)]
pub struct PlaylistState {
    pub playlists: Playlists,
    pub draft: String,
    pub target: Option<String>,
}

impl PlaylistState {
    /// Names in creation order, for pickers.
    pub fn names(&self) -> Vec<String> {
        self.playlists.names().map(str::to_string).collect()
    }

    /// Create the drafted playlist, make it the target and save the
    /// primary result into it.
    pub fn create(&mut self, live: &LiveView) -> Status {
        let name = self.draft.trim().to_string();
        if let Err(e) = self.playlists.create(&name) {
            return Status::error(capitalize(&e.to_string()));
        }
        self.draft.clear();
        self.target = Some(name.clone());
        match self.add(live, 0) {
            Some(status) => status,
            None => Status::success(format!("Created playlist {name}")),
        }
    }

    /// Save result `index` into the target playlist. `None` when there is
    /// nothing to save.
    pub fn add(&mut self, live: &LiveView, index: usize) -> Option<Status> {
        let media = live.media.get(index)?;
        let mood = live.captured?;
        let Some(target) = self.target.clone() else {
            return Some(Status::error("Choose or create a playlist first"));
        };
        let entry = PlaylistEntry::new(media.clone(), mood);
        let name = entry.name();
        Some(match self.playlists.add(&target, entry) {
            Ok(_) => Status::success(format!("Added '{name}' to {target}")),
            Err(e) => Status::error(capitalize(&e.to_string())),
        })
    }

    pub fn remove(&mut self, playlist: &str, index: usize) -> Status {
        match self.playlists.remove(playlist, index) {
            Ok(removed) => {
                if removed.playlist_deleted {
                    self.forget(playlist);
                    Status::success(format!(
                        "Removed '{}' and the now empty {playlist}",
                        removed.entry.name()
                    ))
                } else {
                    Status::success(format!("Removed '{}' from {playlist}", removed.entry.name()))
                }
            }
            Err(e) => Status::error(capitalize(&e.to_string())),
        }
    }

    pub fn delete(&mut self, playlist: &str) -> Status {
        match self.playlists.delete(playlist) {
            Ok(_) => {
                self.forget(playlist);
                Status::success(format!("Deleted playlist {playlist}"))
            }
            Err(e) => Status::error(capitalize(&e.to_string())),
        }
    }

    /// Status for playing `playlist` and the first song to open.
    pub fn play(&self, playlist: &str) -> (Status, Option<String>) {
        match self.playlists.songs(playlist) {
            Some(songs) => (
                Status::success(format!("Playing {playlist} with {} songs", songs.len())),
                songs.first().map(|e| e.media.url.clone()),
            ),
            None => (Status::error(format!("No playlist named '{playlist}'")), None),
        }
    }

    fn forget(&mut self, playlist: &str) {
        if self.target.as_deref() == Some(playlist) {
            self.target = None;
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodtune_core::media::domain::media_resolver::MediaRef;
    use moodtune_core::pipeline::display_sink::StatusLevel;
    use moodtune_core::shared::emotion::{Emotion, Mood};

    fn resolved() -> LiveView {
        let mut live = LiveView::new(true, false);
        live.captured = Some(Mood::new(Emotion::Happy, 77));
        live.media = vec![
            MediaRef::from_video_id("aaaaaaaaaaa"),
            MediaRef::new("https://example.com/b").with_title("Sunshine"),
        ];
        live
    }

    #[test]
    fn test_create_selects_and_saves_primary_result() {
        let live = resolved();
        let mut state = PlaylistState {
            draft: " Road ".into(),
            ..PlaylistState::default()
        };

        let status = state.create(&live);

        assert_eq!(status.message, "Added 'Happy Background Music' to Road");
        assert_eq!(state.target.as_deref(), Some("Road"));
        assert!(state.draft.is_empty());
        assert_eq!(state.playlists.songs("Road").map(<[_]>::len), Some(1));
    }

    #[test]
    fn test_create_without_results_leaves_playlist_empty() {
        let live = LiveView::new(true, false);
        let mut state = PlaylistState {
            draft: "Gym".into(),
            ..PlaylistState::default()
        };

        let status = state.create(&live);

        assert_eq!(status.level, StatusLevel::Success);
        assert_eq!(status.message, "Created playlist Gym");
        assert_eq!(state.names(), vec!["Gym"]);
    }

    #[test]
    fn test_create_reports_blank_and_duplicate_names() {
        let live = resolved();
        let mut state = PlaylistState::default();
        assert_eq!(state.create(&live).message, "Playlist name is empty");

        state.draft = "Road".into();
        state.create(&live);
        state.draft = "Road".into();
        let status = state.create(&live);
        assert_eq!(status.level, StatusLevel::Error);
        assert_eq!(status.message, "Playlist 'Road' already exists");
    }

    #[test]
    fn test_add_needs_a_target() {
        let live = resolved();
        let mut state = PlaylistState::default();
        let status = state.add(&live, 1).unwrap();
        assert_eq!(status.message, "Choose or create a playlist first");

        state.target = Some("Mix".into());
        let status = state.add(&live, 1).unwrap();
        assert_eq!(status.message, "Added 'Sunshine' to Mix");
        assert!(state.add(&live, 9).is_none());
    }

    #[test]
    fn test_removing_last_song_clears_target() {
        let live = resolved();
        let mut state = PlaylistState {
            draft: "Road".into(),
            ..PlaylistState::default()
        };
        state.create(&live);

        let status = state.remove("Road", 0);

        assert_eq!(
            status.message,
            "Removed 'Happy Background Music' and the now empty Road"
        );
        assert_eq!(state.target, None);
        assert!(state.names().is_empty());
    }

    #[test]
    fn test_play_opens_first_song() {
        let live = resolved();
        let mut state = PlaylistState {
            target: Some("Road".into()),
            ..PlaylistState::default()
        };
        state.add(&live, 1);
        state.add(&live, 0);

        let (status, url) = state.play("Road");
        assert_eq!(status.message, "Playing Road with 2 songs");
        assert_eq!(url.as_deref(), Some("https://example.com/b"));

        let (status, url) = state.play("Gym");
        assert_eq!(status.level, StatusLevel::Error);
        assert!(url.is_none());
    }

    #[test]
    fn test_delete_forgets_target() {
        let live = resolved();
        let mut state = PlaylistState {
            draft: "Road".into(),
            ..PlaylistState::default()
        };
        state.create(&live);

        assert_eq!(state.delete("Road").message, "Deleted playlist Road");
        assert_eq!(state.target, None);
        assert_eq!(state.delete("Road").level, StatusLevel::Error);
    }
}
