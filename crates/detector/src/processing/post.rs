use super::LetterboxTransform;
use crate::types::{BoundingBox, RawDetection};

/// Values per row of an end-to-end YOLO export: `x1, y1, x2, y2, score, class`.
pub const END_TO_END_ROW_LEN: usize = 6;

/// Parse the `[1, max_det, 6]` output of a YOLO model exported with built-in NMS.
///
/// Rows scoring below `confidence_threshold` (including the zero padding rows)
/// are dropped. Boxes are mapped back through the letterbox and clamped to the
/// original image; order is the model's.
#[tracing::instrument(skip(output, transform))]
pub fn parse_end_to_end(
    output: &ndarray::ArrayViewD<f32>,
    confidence_threshold: f32,
    transform: &LetterboxTransform,
) -> anyhow::Result<Vec<RawDetection>> {
    let shape = output.shape();
    if shape.len() != 3 || shape[0] == 0 || shape[2] < END_TO_END_ROW_LEN {
        anyhow::bail!(
            "Unexpected detector output shape {:?}, expected [1, N, {}]",
            shape,
            END_TO_END_ROW_LEN
        );
    }

    let num_rows = shape[1];
    let mut detections = Vec::new();

    for i in 0..num_rows {
        let confidence = output[[0, i, 4]];
        if !(confidence >= confidence_threshold) {
            continue;
        }

        let class = output[[0, i, 5]];
        if !class.is_finite() || class < 0.0 {
            anyhow::bail!("Detector produced invalid class value {} at row {}", class, i);
        }

        let bbox = BoundingBox::new(
            transform.invert_x(output[[0, i, 0]]),
            transform.invert_y(output[[0, i, 1]]),
            transform.invert_x(output[[0, i, 2]]),
            transform.invert_y(output[[0, i, 3]]),
        );

        detections.push(RawDetection {
            bbox,
            class_index: class.round() as usize,
            confidence,
        });
    }

    tracing::trace!(rows = num_rows, kept = detections.len(), "Parsed detector output");

    Ok(detections)
}
