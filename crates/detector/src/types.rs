use serde::{Deserialize, Serialize};

/// Decimal places kept for box coordinates and confidences in adapter output.
pub const PRESENTATION_DECIMALS: i32 = 2;

/// Round `value` to [`PRESENTATION_DECIMALS`] places.
#[inline]
pub fn round_to_precision(value: f32) -> f32 {
    let factor = 10f32.powi(PRESENTATION_DECIMALS);
    (value * factor).round() / factor
}

/// Axis-aligned box in original image pixels, serialized as `[x1, y1, x2, y2]`.
///
/// `x1 <= x2` and `y1 <= y2` for well-formed boxes; nothing here enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Signed area; negative for inverted boxes.
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1) * (self.y2 - self.y1)
    }

    pub fn rounded(&self) -> Self {
        Self {
            x1: round_to_precision(self.x1),
            y1: round_to_precision(self.y1),
            x2: round_to_precision(self.x2),
            y2: round_to_precision(self.y2),
        }
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Detector output before class remapping. `class_index` is local to the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub bbox: BoundingBox,
    pub class_index: usize,
    pub confidence: f32,
}

/// Detection in the unified label space.
///
/// `label` always equals the vocabulary entry at `class_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    #[serde(rename = "class")]
    pub class_index: usize,
    pub label: String,
    pub confidence: f32,
}

/// Detections produced for one request, in production order.
pub type DetectionBatch = Vec<Detection>;
