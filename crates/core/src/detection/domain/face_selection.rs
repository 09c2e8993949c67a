use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shared::bounding_box::BoundingBox;

/// Policy for choosing one face when the detector reports several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaceSelection {
    /// Whatever the detector reported first.
    #[default]
    First,
    Largest,
    /// Closest box centre to the frame centre.
    MostCentral,
    /// Highest detector score; boxes without a score rank last.
    MostConfident,
}

impl FaceSelection {
    pub const ALL: [FaceSelection; 4] = [
        FaceSelection::First,
        FaceSelection::Largest,
        FaceSelection::MostCentral,
        FaceSelection::MostConfident,
    ];

    /// Pick one box out of `faces`. Ties keep the earlier box.
    pub fn select(
        self,
        faces: &[BoundingBox],
        frame_w: u32,
        frame_h: u32,
    ) -> Option<BoundingBox> {
        match self {
            FaceSelection::First => faces.first().copied(),
            FaceSelection::Largest => pick_min_by(faces, |b| -(b.area() as f64)),
            FaceSelection::MostCentral => {
                let (fx, fy) = (frame_w as f64 / 2.0, frame_h as f64 / 2.0);
                pick_min_by(faces, |b| {
                    let (cx, cy) = b.center();
                    (cx - fx).powi(2) + (cy - fy).powi(2)
                })
            }
            FaceSelection::MostConfident => {
                pick_min_by(faces, |b| -(b.score.map_or(f64::NEG_INFINITY, f64::from)))
            }
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            FaceSelection::First => "first",
            FaceSelection::Largest => "largest",
            FaceSelection::MostCentral => "most-central",
            FaceSelection::MostConfident => "most-confident",
        }
    }
}

fn pick_min_by(faces: &[BoundingBox], key: impl Fn(&BoundingBox) -> f64) -> Option<BoundingBox> {
    let mut best: Option<(BoundingBox, f64)> = None;
    for face in faces {
        let k = key(face);
        match best {
            Some((_, best_k)) if k >= best_k => {}
            _ => best = Some((*face, k)),
        }
    }
    best.map(|(face, _)| face)
}

impl fmt::Display for FaceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FaceSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|policy| policy.as_str() == s)
            .ok_or_else(|| {
                format!("unknown face selection '{s}' (expected first, largest, most-central or most-confident)")
            })
    }
}
