pub mod about_tab;
pub mod live_tab;
pub mod playlists_tab;
pub mod settings_tab;
