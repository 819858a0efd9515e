use crate::dedup::{IouThreshold, fuse_with};
use crate::errors::FusionError;
use detector::{DetectionBatch, DetectorAdapter, DetectorError};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread;

/// What to do when one detector fails and others succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any detector failure fails the request.
    #[default]
    FailRequest,
    /// Fuse whatever the healthy detectors returned.
    Degrade,
}

/// How detectors are scheduled within one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    /// One scoped thread per detector, all joined before fusion.
    #[default]
    Parallel,
    /// Detectors run one after another in model order.
    Sequential,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FusionReport {
    pub detections: DetectionBatch,
    pub suppressed: usize,
    /// Models skipped under [`FailurePolicy::Degrade`].
    pub failed_models: Vec<String>,
}

/// Runs every adapter on an image and fuses their batches.
///
/// Adapter order is model order; it fixes tie-breaking during fusion, so the
/// result is the same for both [`Execution`] modes.
#[derive(Debug)]
pub struct FusionEngine {
    adapters: Vec<DetectorAdapter>,
    iou_threshold: IouThreshold,
    policy: FailurePolicy,
    execution: Execution,
}

impl FusionEngine {
    pub fn new(
        adapters: Vec<DetectorAdapter>,
        iou_threshold: f32,
        policy: FailurePolicy,
        execution: Execution,
    ) -> Result<Self, FusionError> {
        if adapters.is_empty() {
            return Err(FusionError::NoDetectors);
        }
        let iou_threshold = IouThreshold::new(iou_threshold)?;

        tracing::info!(
            models = adapters.len(),
            iou_threshold = iou_threshold.get(),
            ?policy,
            ?execution,
            "Fusion engine ready"
        );

        Ok(Self {
            adapters,
            iou_threshold,
            policy,
            execution,
        })
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.adapters.iter().map(DetectorAdapter::model)
    }

    pub fn iou_threshold(&self) -> f32 {
        self.iou_threshold.get()
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// Detect objects in `image` with every model and fuse the results.
    ///
    /// Class mapping failures always fail the request. Other detector failures
    /// do so only under [`FailurePolicy::FailRequest`]; when every detector
    /// fails the request fails regardless of policy.
    pub fn detect(&self, image: &RgbImage) -> Result<FusionReport, FusionError> {
        let _span = tracing::info_span!("fusion_detect", models = self.adapters.len()).entered();

        let outcomes = match self.execution {
            Execution::Parallel => self.run_parallel(image),
            Execution::Sequential => self.run_sequential(image),
        };

        let mut batches = Vec::with_capacity(outcomes.len());
        let mut failed_models = Vec::new();

        for (adapter, outcome) in self.adapters.iter().zip(outcomes) {
            match outcome {
                Ok(batch) => batches.push(batch),
                Err(err) if self.policy == FailurePolicy::Degrade && !err.is_configuration() => {
                    tracing::warn!(model = adapter.model(), error = %err, "Detector failed, continuing without it");
                    failed_models.push(adapter.model().to_string());
                }
                Err(err) => {
                    tracing::error!(model = adapter.model(), error = %err, "Detector failed");
                    return Err(err.into());
                }
            }
        }

        if batches.is_empty() {
            return Err(FusionError::AllDetectorsFailed {
                models: failed_models,
            });
        }

        let fused = fuse_with(batches, self.iou_threshold);

        tracing::debug!(
            detections = fused.detections.len(),
            suppressed = fused.suppressed,
            failed = failed_models.len(),
            "Fusion complete"
        );

        Ok(FusionReport {
            detections: fused.detections,
            suppressed: fused.suppressed,
            failed_models,
        })
    }

    fn run_sequential(&self, image: &RgbImage) -> Vec<Result<DetectionBatch, DetectorError>> {
        self.adapters
            .iter()
            .map(|adapter| {
                catch_unwind(AssertUnwindSafe(|| adapter.run(image)))
                    .unwrap_or_else(|_| Err(panicked(adapter)))
            })
            .collect()
    }

    fn run_parallel(&self, image: &RgbImage) -> Vec<Result<DetectionBatch, DetectorError>> {
        thread::scope(|scope| {
            let handles: Vec<_> = self
                .adapters
                .iter()
                .map(|adapter| (adapter, scope.spawn(move || adapter.run(image))))
                .collect();

            handles
                .into_iter()
                .map(|(adapter, handle)| handle.join().unwrap_or_else(|_| Err(panicked(adapter))))
                .collect()
        })
    }
}

fn panicked(adapter: &DetectorAdapter) -> DetectorError {
    DetectorError::Panicked {
        model: adapter.model().to_string(),
    }
}
