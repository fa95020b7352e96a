use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::analysis::bbox::Bbox;

/// A region as reported by a layout model: type label, confidence and the
/// two corner points `[x1, y1, x2, y2]`.
///
/// Nothing about the values is trusted yet; [`Detection::from_raw`] does
/// the validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub kind: String,
    pub score: f32,
    pub coordinates: [f32; 4],
}

impl RawDetection {
    pub fn new(kind: impl Into<String>, score: f32, coordinates: [f32; 4]) -> Self {
        Self {
            kind: kind.into(),
            score,
            coordinates,
        }
    }
}

/// One validated layout region in processed-image pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    kind: String,
    score: f32,
    bbox: Bbox,
}

impl Detection {
    pub fn new(kind: impl Into<String>, score: f32, bbox: Bbox) -> Self {
        Self {
            kind: kind.into(),
            score,
            bbox,
        }
    }

    /// Validates a raw model record. Records with a score outside `[0, 1]`
    /// or a non-finite coordinate are rejected, swapped corners are reordered.
    pub fn from_raw(raw: RawDetection) -> Option<Self> {
        let [x1, y1, x2, y2] = raw.coordinates;
        let bbox = Bbox::from_corners(Vec2::new(x1, y1), Vec2::new(x2, y2));
        if !(0.0..=1.0).contains(&raw.score) || !bbox.is_finite() {
            return None;
        }

        Some(Self {
            kind: raw.kind,
            score: raw.score,
            bbox,
        })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn bbox(&self) -> &Bbox {
        &self.bbox
    }

    pub fn width(&self) -> f32 {
        self.bbox.width()
    }

    pub fn height(&self) -> f32 {
        self.bbox.height()
    }

    /// Text drawn next to the box on the annotated image.
    pub fn caption(&self) -> String {
        format!("{} ({:.2})", self.kind, self.score)
    }
}

/// Serialized form of a [`Detection`] in the `/parse-layout` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub score: f32,
    pub block: BlockPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockPayload {
    pub x_1: f32,
    pub y_1: f32,
    pub x_2: f32,
    pub y_2: f32,
    pub width: f32,
    pub height: f32,
}

impl From<&Detection> for LayoutPayload {
    fn from(detection: &Detection) -> Self {
        let bbox = detection.bbox();
        Self {
            kind: detection.kind().to_string(),
            score: detection.score(),
            block: BlockPayload {
                x_1: bbox.min.x,
                y_1: bbox.min.y,
                x_2: bbox.max.x,
                y_2: bbox.max.y,
                width: bbox.width(),
                height: bbox.height(),
            },
        }
    }
}
