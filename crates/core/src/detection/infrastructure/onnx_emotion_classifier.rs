use std::fmt;
use std::path::Path;
use std::str::FromStr;

use image::imageops::FilterType;
use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::detection::domain::emotion_classifier::{softmax, EmotionClassifier, EmotionScores};
use crate::shared::constants::FACE_INPUT_SIZE;
use crate::shared::emotion::Emotion;

/// Output label order and input scaling of a facial-expression model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelLayout {
    /// 7 outputs in [`Emotion`] order, pixels scaled to `0..1`.
    Fer2013,
    /// 8 outputs (neutral, happiness, surprise, sadness, anger, disgust,
    /// fear, contempt), raw `0..255` pixels, logits.
    #[default]
    FerPlus,
}

const FERPLUS_ORDER: [Emotion; 8] = [
    Emotion::Neutral,
    Emotion::Happy,
    Emotion::Surprise,
    Emotion::Sad,
    Emotion::Angry,
    Emotion::Disgust,
    Emotion::Fear,
    // contempt
    Emotion::Disgust,
];

impl LabelLayout {
    pub const ALL: [LabelLayout; 2] = [LabelLayout::FerPlus, LabelLayout::Fer2013];

    pub fn output_len(self) -> usize {
        match self {
            LabelLayout::Fer2013 => 7,
            LabelLayout::FerPlus => 8,
        }
    }

    fn pixel_scale(self) -> f32 {
        match self {
            LabelLayout::Fer2013 => 1.0 / 255.0,
            LabelLayout::FerPlus => 1.0,
        }
    }

    fn label(self, index: usize) -> Emotion {
        match self {
            LabelLayout::Fer2013 => Emotion::ALL[index],
            LabelLayout::FerPlus => FERPLUS_ORDER[index],
        }
    }
}

impl fmt::Display for LabelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LabelLayout::Fer2013 => "fer2013",
            LabelLayout::FerPlus => "ferplus",
        })
    }
}

impl FromStr for LabelLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fer2013" => Ok(LabelLayout::Fer2013),
            "ferplus" | "fer+" => Ok(LabelLayout::FerPlus),
            _ => Err(format!("unknown label layout '{s}' (expected fer2013 or ferplus)")),
        }
    }
}

/// Where the single gray channel sits in the model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelOrder {
    /// `[1, 1, H, W]`
    First,
    /// `[1, H, W, 1]`
    Last,
}

/// Facial-expression classifier backed by an ONNX Runtime session.
pub struct OnnxEmotionClassifier {
    session: ort::session::Session,
    layout: LabelLayout,
    channel_order: ChannelOrder,
    input_size: u32,
}

impl OnnxEmotionClassifier {
    /// Load a classifier model. Input side length and channel position
    /// are read from the model's input shape.
    pub fn new(model_path: &Path, layout: LabelLayout) -> Result<Self, Box<dyn std::error::Error>> {
        let session = super::onnx_session::load(model_path)?;

        let shape: Option<Vec<i64>> =
            session
                .inputs()
                .first()
                .and_then(|input| match input.dtype() {
                    ort::value::ValueType::Tensor { ref shape, .. } => {
                        Some(shape.iter().copied().collect())
                    }
                    _ => None,
                });
        let (channel_order, input_size) = input_geometry(shape.as_deref());

        log::debug!(
            "Loaded emotion model {} ({layout}, {input_size}px, {channel_order:?})",
            model_path.display()
        );

        Ok(Self {
            session,
            layout,
            channel_order,
            input_size,
        })
    }
}

impl EmotionClassifier for OnnxEmotionClassifier {
    fn classify(&mut self, face: &GrayImage) -> Result<EmotionScores, Box<dyn std::error::Error>> {
        let tensor = preprocess(face, self.input_size, self.channel_order, self.layout);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("emotion model produced no outputs".into());
        }
        let raw = outputs[0].try_extract_array::<f32>()?;
        let raw = raw.as_slice().ok_or("cannot get tensor slice")?;
        to_scores(raw, self.layout)
    }
}

fn input_geometry(shape: Option<&[i64]>) -> (ChannelOrder, u32) {
    match shape {
        Some([_, 1, h, _]) if *h > 0 => (ChannelOrder::First, *h as u32),
        Some([_, h, _, 1]) if *h > 0 => (ChannelOrder::Last, *h as u32),
        Some([_, _, _, 1]) => (ChannelOrder::Last, FACE_INPUT_SIZE),
        _ => (ChannelOrder::First, FACE_INPUT_SIZE),
    }
}

fn preprocess(
    face: &GrayImage,
    size: u32,
    channel_order: ChannelOrder,
    layout: LabelLayout,
) -> ndarray::Array4<f32> {
    let resized = if face.dimensions() == (size, size) {
        face.clone()
    } else {
        image::imageops::resize(face, size, size, FilterType::Triangle)
    };
    let n = size as usize;
    let dims = match channel_order {
        ChannelOrder::First => (1, 1, n, n),
        ChannelOrder::Last => (1, n, n, 1),
    };
    let scale = layout.pixel_scale();
    let mut tensor = ndarray::Array4::<f32>::zeros(dims);
    for (x, y, pixel) in resized.enumerate_pixels() {
        let v = pixel.0[0] as f32 * scale;
        let (x, y) = (x as usize, y as usize);
        match channel_order {
            ChannelOrder::First => tensor[[0, 0, y, x]] = v,
            ChannelOrder::Last => tensor[[0, y, x, 0]] = v,
        }
    }
    tensor
}

/// Fold raw model outputs into per-[`Emotion`] probabilities.
///
/// Outputs that are already a distribution are kept as-is; anything else
/// is treated as logits.
fn to_scores(raw: &[f32], layout: LabelLayout) -> Result<EmotionScores, Box<dyn std::error::Error>> {
    if raw.len() != layout.output_len() {
        return Err(format!(
            "emotion model returned {} scores, {layout} expects {}",
            raw.len(),
            layout.output_len()
        )
        .into());
    }

    let is_distribution = raw.iter().all(|p| (0.0..=1.0).contains(p))
        && (raw.iter().sum::<f32>() - 1.0).abs() < 1e-3;
    let probabilities = if is_distribution {
        raw.to_vec()
    } else {
        softmax(raw)
    };

    let mut folded = [0.0f32; 7];
    for (i, p) in probabilities.into_iter().enumerate() {
        folded[layout.label(i).code() as usize] += p;
    }
    Ok(EmotionScores::new(folded))
}
