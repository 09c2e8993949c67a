pub mod camera_frame_source;
pub mod video_file_frame_source;
