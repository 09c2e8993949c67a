pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMOTION_MODEL_NAME: &str = "emotion-ferplus-8.onnx";
pub const EMOTION_MODEL_URL: &str =
    "https://github.com/onnx/models/raw/main/validated/vision/body_analysis/emotion_ferplus/model/emotion-ferplus-8.onnx";

/// Frames are scaled to this size before estimation and display.
pub const WORKING_WIDTH: u32 = 640;
pub const WORKING_HEIGHT: u32 = 480;

/// Side length of the square grayscale face crop fed to the classifier.
pub const FACE_INPUT_SIZE: u32 = 64;

pub const DEFAULT_CAMERA_INDEX: u32 = 0;

pub const VIDEO_SEARCH_URL: &str = "https://www.youtube.com/results";
pub const VIDEO_WATCH_URL: &str = "https://www.youtube.com/watch";
pub const DEFAULT_QUERY_SUFFIX: &str = "background tunes";
pub const DEFAULT_MAX_RESULTS: usize = 5;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];
