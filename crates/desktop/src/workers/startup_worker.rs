use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use moodtune_core::detection::domain::emotion_estimator::EmotionEstimator;
use moodtune_core::detection::domain::face_emotion_estimator::FaceEmotionEstimator;
use moodtune_core::detection::domain::face_selection::FaceSelection;
use moodtune_core::detection::infrastructure::onnx_emotion_classifier::{
    LabelLayout, OnnxEmotionClassifier,
};
use moodtune_core::detection::infrastructure::onnx_face_detector::OnnxFaceDetector;
use moodtune_core::shared::constants::{
    EMOTION_MODEL_NAME, EMOTION_MODEL_URL, FACE_MODEL_NAME, FACE_MODEL_URL,
};
use moodtune_core::shared::model_resolver;

pub enum StartupMessage {
    Downloading {
        model: &'static str,
        downloaded: u64,
        total: u64,
    },
    Ready(Box<dyn EmotionEstimator>),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorOptions {
    pub face_selection: FaceSelection,
    pub label_layout: LabelLayout,
    pub confidence: f64,
}

/// Resolve both models and build the estimator off the UI thread.
pub fn spawn(options: EstimatorOptions) -> Receiver<StartupMessage> {
    spawn_with(move |progress| build_estimator(options, progress))
}

type Progress = dyn Fn(&'static str, u64, u64) + Send + Sync;

fn spawn_with<F>(build: F) -> Receiver<StartupMessage>
where
    F: FnOnce(Box<Progress>) -> Result<Box<dyn EmotionEstimator>, String> + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::unbounded();
    let progress_tx = tx.clone();
    let progress: Box<Progress> = Box::new(move |model, downloaded, total| {
        let _ = progress_tx.send(StartupMessage::Downloading {
            model,
            downloaded,
            total,
        });
    });

    thread::spawn(move || {
        let message = match build(progress) {
            Ok(estimator) => StartupMessage::Ready(estimator),
            Err(e) => {
                log::error!("Startup failed: {e}");
                StartupMessage::Failed(e)
            }
        };
        send(&tx, message);
    });
    rx
}

fn send(tx: &Sender<StartupMessage>, message: StartupMessage) {
    if tx.send(message).is_err() {
        log::debug!("Startup result dropped, app already closed");
    }
}

fn build_estimator(
    options: EstimatorOptions,
    progress: Box<Progress>,
) -> Result<Box<dyn EmotionEstimator>, String> {
    let progress: Arc<Progress> = progress.into();
    let face_path = resolve(FACE_MODEL_NAME, FACE_MODEL_URL, &progress)?;
    let emotion_path = resolve(EMOTION_MODEL_NAME, EMOTION_MODEL_URL, &progress)?;

    let detector =
        OnnxFaceDetector::new(&face_path, options.confidence).map_err(|e| e.to_string())?;
    let classifier = OnnxEmotionClassifier::new(&emotion_path, options.label_layout)
        .map_err(|e| e.to_string())?;
    log::info!(
        "Estimator ready ({} layout, {} face)",
        options.label_layout,
        options.face_selection
    );

    Ok(Box::new(FaceEmotionEstimator::new(
        Box::new(detector),
        Box::new(classifier),
        options.face_selection,
    )))
}

fn resolve(
    name: &'static str,
    url: &str,
    progress: &Arc<Progress>,
) -> Result<PathBuf, String> {
    let progress = Arc::clone(progress);
    model_resolver::resolve(
        name,
        url,
        None,
        Some(Box::new(move |downloaded, total| {
            progress(name, downloaded, total)
        })),
    )
    .map_err(|e| e.to_string())
}
