use moodtune_core::media::domain::media_resolver::MediaRef;
use moodtune_core::media::domain::playlists::{PlaylistEntry, Playlists};
use moodtune_core::shared::emotion::Mood;

pub const HELP: &str = "Playlists: add [n] <name>, new <name>, lists, play <name>, rm <n> <name>, del <name>";

/// Playlist commands typed at the prompt. Result and song numbers are
/// 1-based, as printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistCommand {
    /// Save result `result` of the last search to `playlist`.
    Add { playlist: String, result: usize },
    New(String),
    List,
    Play(String),
    Remove { playlist: String, song: usize },
    Delete(String),
}

/// What a command printed and, for `play`, the first song to open.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reply {
    pub lines: Vec<String>,
    pub open: Option<String>,
}

impl Reply {
    fn line(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            open: None,
        }
    }
}

/// Parse a playlist command. `play` with no name is a session command and
/// is not matched here.
pub fn parse(line: &str) -> Option<PlaylistCommand> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    match (word.to_ascii_lowercase().as_str(), rest) {
        ("lists" | "l", "") => Some(PlaylistCommand::List),
        (_, "") => None,
        ("add" | "a", rest) => {
            let (result, playlist) = leading_number(rest).unwrap_or((1, rest));
            Some(PlaylistCommand::Add {
                playlist: playlist.to_string(),
                result,
            })
        }
        ("new", name) => Some(PlaylistCommand::New(name.to_string())),
        ("play", name) => Some(PlaylistCommand::Play(name.to_string())),
        ("rm", rest) => {
            let (song, playlist) = leading_number(rest)?;
            Some(PlaylistCommand::Remove {
                playlist: playlist.to_string(),
                song,
            })
        }
        ("del", name) => Some(PlaylistCommand::Delete(name.to_string())),
        _ => None,
    }
}

fn leading_number(text: &str) -> Option<(usize, &str)> {
    let (first, rest) = text.split_once(char::is_whitespace)?;
    let n = first.parse().ok()?;
    let rest = rest.trim();
    (!rest.is_empty()).then_some((n, rest))
}

/// In-memory playlists plus the latest search results they are filled from.
#[derive(Default)]
pub struct PlaylistShell {
    playlists: Playlists,
    results: Vec<MediaRef>,
    mood: Option<Mood>,
}

impl PlaylistShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_results(&mut self, mood: Mood, media: &[MediaRef]) {
        self.mood = Some(mood);
        self.results = media.to_vec();
    }

    pub fn apply(&mut self, command: PlaylistCommand) -> Result<Reply, String> {
        match command {
            PlaylistCommand::Add { playlist, result } => {
                let mood = self.mood.ok_or("Nothing to add yet, capture a mood first")?;
                let media = result
                    .checked_sub(1)
                    .and_then(|i| self.results.get(i))
                    .ok_or_else(|| format!("No result {result}"))?;
                let entry = PlaylistEntry::new(media.clone(), mood);
                let name = entry.name();
                self.playlists
                    .add(&playlist, entry)
                    .map_err(|e| e.to_string())?;
                Ok(Reply::line(format!("Added '{name}' to {}", playlist.trim())))
            }
            PlaylistCommand::New(name) => {
                self.playlists.create(&name).map_err(|e| e.to_string())?;
                Ok(Reply::line(format!("Created playlist {}", name.trim())))
            }
            PlaylistCommand::List => {
                if self.playlists.is_empty() {
                    return Ok(Reply::line("No playlists yet"));
                }
                let lines = self
                    .playlists
                    .names()
                    .map(|name| {
                        let count = self.playlists.songs(name).map_or(0, <[_]>::len);
                        format!("{name} ({count} songs)")
                    })
                    .collect();
                Ok(Reply { lines, open: None })
            }
            PlaylistCommand::Play(name) => {
                let songs = self
                    .playlists
                    .songs(&name)
                    .ok_or_else(|| format!("no playlist named '{}'", name.trim()))?;
                let mut lines = vec![format!("Playing {} with {} songs", name.trim(), songs.len())];
                lines.extend(
                    songs
                        .iter()
                        .enumerate()
                        .map(|(i, e)| format!("  {}. {} - {}", i + 1, e.name(), e.mood.emotion)),
                );
                Ok(Reply {
                    lines,
                    open: songs.first().map(|e| e.media.url.clone()),
                })
            }
            PlaylistCommand::Remove { playlist, song } => {
                let index = song.checked_sub(1).ok_or_else(|| format!("No song {song}"))?;
                let removed = self
                    .playlists
                    .remove(&playlist, index)
                    .map_err(|e| e.to_string())?;
                let mut reply = Reply::line(format!(
                    "Removed '{}' from {}",
                    removed.entry.name(),
                    playlist.trim()
                ));
                if removed.playlist_deleted {
                    reply
                        .lines
                        .push(format!("Removed empty playlist {}", playlist.trim()));
                }
                Ok(reply)
            }
            PlaylistCommand::Delete(name) => {
                self.playlists.delete(&name).map_err(|e| e.to_string())?;
                Ok(Reply::line(format!("Deleted playlist {}", name.trim())))
            }
        }
    }
}
