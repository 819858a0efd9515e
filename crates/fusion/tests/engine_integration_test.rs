use detector::{BoundingBox, Detector, DetectorAdapter, DetectorError, RawDetection};
use fusion::{Execution, FailurePolicy, FusionEngine, FusionError};
use image::RgbImage;
use std::sync::{Arc, Barrier};
use vocabulary::Vocabulary;

enum Behaviour {
    Returns(Vec<RawDetection>),
    Fails,
    Panics,
    /// Waits for every detector to reach the barrier before returning.
    Rendezvous(Arc<Barrier>, Vec<RawDetection>),
}

struct FakeDetector(Behaviour);

impl Detector for FakeDetector {
    fn predict(&mut self, _image: &RgbImage, _threshold: f32) -> anyhow::Result<Vec<RawDetection>> {
        match &self.0 {
            Behaviour::Returns(detections) => Ok(detections.clone()),
            Behaviour::Fails => anyhow::bail!("session run failed"),
            Behaviour::Panics => panic!("detector bug"),
            Behaviour::Rendezvous(barrier, detections) => {
                barrier.wait();
                Ok(detections.clone())
            }
        }
    }
}

fn raw(bbox: [f32; 4], class_index: usize, confidence: f32) -> RawDetection {
    RawDetection {
        bbox: BoundingBox::from(bbox),
        class_index,
        confidence,
    }
}

/// model1 knows `car, person`; model2 knows `truck, car`.
/// Unified: car=0, person=1, truck=2.
fn vocabulary() -> Vocabulary {
    Vocabulary::init([
        ("model1", vec!["car", "person"]),
        ("model2", vec!["truck", "car"]),
    ])
}

fn build_engine(
    behaviours: [Behaviour; 2],
    policy: FailurePolicy,
    execution: Execution,
) -> Result<FusionEngine, FusionError> {
    let vocab = vocabulary();
    let adapters = behaviours
        .into_iter()
        .zip(vocab.maps())
        .map(|(behaviour, map)| {
            DetectorAdapter::new(
                Box::new(FakeDetector(behaviour)),
                0.25,
                map.clone(),
                vocab.classes().clone(),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    FusionEngine::new(adapters, 0.5, policy, execution)
}

fn model1_output() -> Vec<RawDetection> {
    vec![
        raw([0.0, 0.0, 100.0, 100.0], 0, 0.9),
        raw([200.0, 200.0, 240.0, 300.0], 1, 0.75),
    ]
}

fn model2_output() -> Vec<RawDetection> {
    vec![
        // Same car as model1 at IoU 0.8, lower confidence
        raw([0.0, 0.0, 100.0, 80.0], 1, 0.6),
        // Truck with the same box as model1's car
        raw([0.0, 0.0, 100.0, 100.0], 0, 0.85),
    ]
}

fn image() -> RgbImage {
    RgbImage::new(320, 320)
}

/// Test the full fan-out, remap and fusion path
///
/// Tests:
/// - Cross-model duplicate of the same label is suppressed
/// - Different labels on the same box both survive
/// - Output ordered by confidence
#[test]
fn test_engine_fuses_both_models() {
    let engine = build_engine(
        [Behaviour::Returns(model1_output()), Behaviour::Returns(model2_output())],
        FailurePolicy::FailRequest,
        Execution::Parallel,
    )
    .unwrap();

    let report = engine.detect(&image()).unwrap();

    let summary: Vec<_> = report
        .detections
        .iter()
        .map(|d| (d.label.as_str(), d.class_index, d.confidence))
        .collect();
    assert_eq!(
        summary,
        vec![("car", 0, 0.9), ("truck", 2, 0.85), ("person", 1, 0.75)]
    );
    assert_eq!(report.suppressed, 1);
    assert!(report.failed_models.is_empty());
}

#[test]
fn test_execution_modes_agree() {
    let run = |execution| {
        build_engine(
            [Behaviour::Returns(model1_output()), Behaviour::Returns(model2_output())],
            FailurePolicy::FailRequest,
            execution,
        )
        .unwrap()
        .detect(&image())
        .unwrap()
    };

    assert_eq!(run(Execution::Parallel), run(Execution::Sequential));
}

#[test]
fn test_parallel_execution_runs_detectors_concurrently() {
    // Deadlocks unless both detectors are in flight at once
    let barrier = Arc::new(Barrier::new(2));
    let engine = build_engine(
        [
            Behaviour::Rendezvous(barrier.clone(), model1_output()),
            Behaviour::Rendezvous(barrier, model2_output()),
        ],
        FailurePolicy::FailRequest,
        Execution::Parallel,
    )
    .unwrap();

    assert_eq!(engine.detect(&image()).unwrap().detections.len(), 3);
}

#[test]
fn test_fail_request_policy_propagates_detector_error() {
    for execution in [Execution::Parallel, Execution::Sequential] {
        let engine = build_engine(
            [Behaviour::Returns(model1_output()), Behaviour::Fails],
            FailurePolicy::FailRequest,
            execution,
        )
        .unwrap();

        match engine.detect(&image()) {
            Err(FusionError::Detector(DetectorError::Inference { model, .. })) => {
                assert_eq!(model, "model2")
            }
            other => panic!("Expected detector failure, got {:?}", other),
        }
    }
}

#[test]
fn test_degrade_policy_uses_healthy_detectors() {
    let engine = build_engine(
        [Behaviour::Fails, Behaviour::Returns(model2_output())],
        FailurePolicy::Degrade,
        Execution::Sequential,
    )
    .unwrap();

    let report = engine.detect(&image()).unwrap();

    assert_eq!(report.failed_models, vec!["model1".to_string()]);
    let labels: Vec<_> = report.detections.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, vec!["truck", "car"]);
}

#[test]
fn test_degrade_policy_fails_when_every_detector_fails() {
    let engine = build_engine(
        [Behaviour::Fails, Behaviour::Fails],
        FailurePolicy::Degrade,
        Execution::Parallel,
    )
    .unwrap();

    match engine.detect(&image()) {
        Err(FusionError::AllDetectorsFailed { models }) => {
            assert_eq!(models, vec!["model1", "model2"])
        }
        other => panic!("Expected AllDetectorsFailed, got {:?}", other),
    }
}

#[test]
fn test_unmapped_class_fails_even_when_degrading() {
    let engine = build_engine(
        [
            Behaviour::Returns(model1_output()),
            Behaviour::Returns(vec![raw([0.0, 0.0, 1.0, 1.0], 9, 0.9)]),
        ],
        FailurePolicy::Degrade,
        Execution::Parallel,
    )
    .unwrap();

    let err = engine.detect(&image()).unwrap_err();
    assert!(matches!(err, FusionError::Detector(DetectorError::Mapping(_))));
    assert!(err.is_configuration());
}

#[test]
fn test_panicking_detector_is_a_detector_failure() {
    for execution in [Execution::Parallel, Execution::Sequential] {
        let failing = build_engine(
            [Behaviour::Panics, Behaviour::Returns(model2_output())],
            FailurePolicy::FailRequest,
            execution,
        )
        .unwrap();
        assert!(matches!(
            failing.detect(&image()),
            Err(FusionError::Detector(DetectorError::Panicked { .. }))
        ));

        let degraded = build_engine(
            [Behaviour::Panics, Behaviour::Returns(model2_output())],
            FailurePolicy::Degrade,
            execution,
        )
        .unwrap();
        let report = degraded.detect(&image()).unwrap();
        assert_eq!(report.failed_models, vec!["model1".to_string()]);
        assert_eq!(report.detections.len(), 2);

        // Mutex is usable again after the panic
        assert!(degraded.detect(&image()).is_ok());
    }
}

#[test]
fn test_engine_rejects_invalid_iou_threshold() {
    let vocab = vocabulary();
    let adapter = DetectorAdapter::new(
        Box::new(FakeDetector(Behaviour::Fails)),
        0.25,
        vocab.maps()[0].clone(),
        vocab.classes().clone(),
    )
    .unwrap();

    let result = FusionEngine::new(vec![adapter], 1.2, FailurePolicy::FailRequest, Execution::Parallel);
    assert!(matches!(result, Err(FusionError::InvalidIouThreshold(_))));
}

#[test]
fn test_models_listed_in_order() {
    let engine = build_engine(
        [Behaviour::Fails, Behaviour::Fails],
        FailurePolicy::FailRequest,
        Execution::Parallel,
    )
    .unwrap();
    assert_eq!(engine.models().collect::<Vec<_>>(), vec!["model1", "model2"]);
    assert_eq!(engine.iou_threshold(), 0.5);
}
