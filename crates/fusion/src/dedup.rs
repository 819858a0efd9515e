use crate::errors::FusionError;
use crate::iou::iou;
use detector::{Detection, DetectionBatch};

/// IoU at or above which two same-label detections count as duplicates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IouThreshold(f32);

impl IouThreshold {
    /// Accepts values in `[0, 1]`. NaN is rejected.
    pub fn new(value: f32) -> Result<Self, FusionError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(FusionError::InvalidIouThreshold(value))
        }
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl TryFrom<f32> for IouThreshold {
    type Error = FusionError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Outcome of [`fuse_with`].
#[derive(Debug, Clone, PartialEq)]
pub struct Fused {
    /// Accepted detections, highest confidence first.
    pub detections: DetectionBatch,
    /// Number of detections dropped as duplicates.
    pub suppressed: usize,
}

/// Merge `batches` into one duplicate-free batch.
///
/// Batches are concatenated in the order given, then ordered by confidence,
/// descending. The sort is stable, so equal confidences keep concatenation
/// order. Each detection is accepted unless an already accepted detection with
/// the same label overlaps it with IoU >= `iou_threshold`. Detections with
/// different labels never suppress each other.
pub fn fuse<I>(batches: I, iou_threshold: f32) -> Result<DetectionBatch, FusionError>
where
    I: IntoIterator<Item = DetectionBatch>,
{
    let threshold = IouThreshold::new(iou_threshold)?;
    Ok(fuse_with(batches, threshold).detections)
}

/// [`fuse`] with a pre-validated threshold, also reporting how many
/// detections were suppressed.
pub fn fuse_with<I>(batches: I, threshold: IouThreshold) -> Fused
where
    I: IntoIterator<Item = DetectionBatch>,
{
    let mut combined: Vec<Detection> = batches.into_iter().flatten().collect();
    combined.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut accepted: Vec<Detection> = Vec::with_capacity(combined.len());
    let mut suppressed = 0;

    for candidate in combined {
        let duplicate = accepted.iter().any(|kept| {
            kept.label == candidate.label && iou(&kept.bbox, &candidate.bbox) >= threshold.get()
        });

        if duplicate {
            suppressed += 1;
        } else {
            accepted.push(candidate);
        }
    }

    tracing::trace!(
        kept = accepted.len(),
        suppressed,
        iou_threshold = threshold.get(),
        "Fused detections"
    );

    Fused {
        detections: accepted,
        suppressed,
    }
}
