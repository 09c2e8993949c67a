pub mod song_table;
pub mod video_search_resolver;
