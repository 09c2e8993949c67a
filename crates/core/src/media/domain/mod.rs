pub mod media_resolver;
pub mod playlists;
