pub mod onnx_emotion_classifier;
pub mod onnx_face_detector;
mod onnx_session;
