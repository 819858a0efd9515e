use crate::types::RawDetection;
use image::RgbImage;

#[cfg(feature = "ort-backend")]
pub mod ort;

/// An object detection model.
///
/// Implementations apply their own confidence filter and non-maximum
/// suppression; every returned detection is already final for this model.
pub trait Detector: Send {
    /// Detect objects in `image`, returning detections in the model's native
    /// order with local class indices and original-image pixel coordinates.
    fn predict(
        &mut self,
        image: &RgbImage,
        confidence_threshold: f32,
    ) -> anyhow::Result<Vec<RawDetection>>;

    /// Number of classes the model can predict, when the model says so.
    fn num_classes(&self) -> Option<usize> {
        None
    }
}

/// Class count from the `names` metadata of an Ultralytics export, a mapping
/// written like `{0: 'person', 1: 'bicycle'}`.
///
/// Returns the highest index plus one, or `None` when the text is not such a
/// mapping.
pub fn class_count_from_metadata(names: &str) -> Option<usize> {
    let body = names.trim().strip_prefix('{')?.strip_suffix('}')?;

    let mut count = 0;
    let mut key = String::new();
    let mut quote: Option<char> = None;
    let mut in_value = false;

    for c in body.chars() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ':') if !in_value => {
                let index: usize = key.trim().parse().ok()?;
                count = count.max(index + 1);
                key.clear();
                in_value = true;
            }
            (None, ',') => {
                if !in_value && !key.trim().is_empty() {
                    return None;
                }
                in_value = false;
            }
            (None, c) if !in_value => key.push(c),
            (None, _) => {}
        }
    }

    if quote.is_some() || !key.trim().is_empty() {
        return None;
    }
    Some(count)
}
