pub mod emotion_classifier;
pub mod emotion_estimator;
pub mod face_detector;
pub mod face_emotion_estimator;
pub mod face_selection;
