use thiserror::Error;

use crate::media::domain::media_resolver::MediaRef;
use crate::shared::emotion::Mood;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaylistError {
    #[error("playlist name is empty")]
    EmptyName,
    #[error("playlist '{0}' already exists")]
    AlreadyExists(String),
    #[error("no playlist named '{0}'")]
    NotFound(String),
    #[error("playlist '{name}' has no song {index}")]
    NoSuchSong { name: String, index: usize },
}

/// A saved song and the mood it was found for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub media: MediaRef,
    pub mood: Mood,
}

impl PlaylistEntry {
    pub fn new(media: MediaRef, mood: Mood) -> Self {
        Self { media, mood }
    }

    /// The media title, or a name made from the mood for untitled links.
    pub fn name(&self) -> String {
        match &self.media.title {
            Some(title) => title.clone(),
            None => format!("{} Background Music", self.mood.emotion),
        }
    }
}

/// Result of [`Playlists::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removed {
    pub entry: PlaylistEntry,
    /// The playlist became empty and was deleted with it.
    pub playlist_deleted: bool,
}

/// Named playlists kept for the lifetime of the app, in creation order.
///
/// Names are trimmed and compared exactly. A playlist never stays empty
/// once its last song is removed.
#[derive(Debug, Clone, Default)]
pub struct Playlists {
    lists: Vec<(String, Vec<PlaylistEntry>)>,
}

impl Playlists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, name: &str) -> Result<(), PlaylistError> {
        let name = normalize(name)?;
        if self.position(name).is_some() {
            return Err(PlaylistError::AlreadyExists(name.to_string()));
        }
        self.lists.push((name.to_string(), Vec::new()));
        log::info!("Created playlist '{name}'");
        Ok(())
    }

    /// Append `entry`, creating the playlist when needed. Returns the new
    /// song count.
    pub fn add(&mut self, name: &str, entry: PlaylistEntry) -> Result<usize, PlaylistError> {
        let name = normalize(name)?;
        let index = match self.position(name) {
            Some(index) => index,
            None => {
                self.lists.push((name.to_string(), Vec::new()));
                self.lists.len() - 1
            }
        };
        let songs = &mut self.lists[index].1;
        log::debug!("Adding '{}' to playlist '{name}'", entry.name());
        songs.push(entry);
        Ok(songs.len())
    }

    /// Remove the song at `index` (zero-based).
    pub fn remove(&mut self, name: &str, index: usize) -> Result<Removed, PlaylistError> {
        let position = self
            .position(name.trim())
            .ok_or_else(|| PlaylistError::NotFound(name.trim().to_string()))?;
        let songs = &mut self.lists[position].1;
        if index >= songs.len() {
            return Err(PlaylistError::NoSuchSong {
                name: name.trim().to_string(),
                index,
            });
        }
        let entry = songs.remove(index);
        let playlist_deleted = songs.is_empty();
        if playlist_deleted {
            self.lists.remove(position);
        }
        Ok(Removed {
            entry,
            playlist_deleted,
        })
    }

    /// Delete a playlist, returning its songs.
    pub fn delete(&mut self, name: &str) -> Result<Vec<PlaylistEntry>, PlaylistError> {
        let position = self
            .position(name.trim())
            .ok_or_else(|| PlaylistError::NotFound(name.trim().to_string()))?;
        let (name, songs) = self.lists.remove(position);
        log::info!("Deleted playlist '{name}' ({} songs)", songs.len());
        Ok(songs)
    }

    /// Songs of `name` in the order they were added.
    pub fn songs(&self, name: &str) -> Option<&[PlaylistEntry]> {
        self.position(name.trim())
            .map(|index| self.lists[index].1.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.lists.iter().map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name.trim()).is_some()
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.lists.iter().position(|(n, _)| n == name)
    }
}

fn normalize(name: &str) -> Result<&str, PlaylistError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PlaylistError::EmptyName);
    }
    Ok(name)
}
