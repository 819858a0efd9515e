use crate::backend::Detector;
use crate::errors::DetectorError;
use crate::types::{Detection, DetectionBatch, RawDetection, round_to_precision};
use image::RgbImage;
use parking_lot::Mutex;
use std::sync::Arc;
use vocabulary::{ClassIndexMap, ClassVocabulary, VocabularyError};

/// Runs one detector and expresses its output in the unified label space.
///
/// The detector sits behind its own mutex; the vocabulary and index map are
/// read-only and shared freely.
pub struct DetectorAdapter {
    model: String,
    detector: Mutex<Box<dyn Detector>>,
    confidence_threshold: f32,
    index_map: ClassIndexMap,
    classes: Arc<ClassVocabulary>,
}

impl DetectorAdapter {
    /// The model name is taken from `index_map`. A detector reporting more
    /// classes than `index_map` covers is rejected.
    pub fn new(
        detector: Box<dyn Detector>,
        confidence_threshold: f32,
        index_map: ClassIndexMap,
        classes: Arc<ClassVocabulary>,
    ) -> Result<Self, DetectorError> {
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(DetectorError::InvalidConfidenceThreshold(
                confidence_threshold,
            ));
        }

        if let Some(reported) = detector.num_classes()
            && reported > index_map.len()
        {
            return Err(DetectorError::ClassCountMismatch {
                model: index_map.model().to_string(),
                reported,
                mapped: index_map.len(),
            });
        }

        Ok(Self {
            model: index_map.model().to_string(),
            detector: Mutex::new(detector),
            confidence_threshold,
            index_map,
            classes,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Detect objects in `image`.
    ///
    /// Output keeps the detector's order. Boxes and confidences are rounded to
    /// two decimals; boxes are otherwise passed through untouched. A local class
    /// index missing from the index map fails the whole batch.
    pub fn run(&self, image: &RgbImage) -> Result<DetectionBatch, DetectorError> {
        let _span = tracing::info_span!("detector_adapter_run", model = %self.model).entered();

        let raw = {
            let mut detector = self.detector.lock();
            detector
                .predict(image, self.confidence_threshold)
                .map_err(|source| DetectorError::Inference {
                    model: self.model.clone(),
                    source,
                })?
        };

        let batch = raw
            .into_iter()
            .map(|r| self.normalize(r))
            .collect::<Result<DetectionBatch, _>>()?;

        tracing::debug!(detections = batch.len(), "Detector finished");

        Ok(batch)
    }

    fn normalize(&self, raw: RawDetection) -> Result<Detection, VocabularyError> {
        let class_index = self.index_map.resolve(raw.class_index)?;
        let label = self.classes.label(class_index)?.to_string();

        Ok(Detection {
            bbox: raw.bbox.rounded(),
            class_index,
            label,
            confidence: round_to_precision(raw.confidence),
        })
    }
}

impl std::fmt::Debug for DetectorAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorAdapter")
            .field("model", &self.model)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("local_classes", &self.index_map.len())
            .finish_non_exhaustive()
    }
}
