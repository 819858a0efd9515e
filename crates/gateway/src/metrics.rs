use axum::http::StatusCode;
use fusion::{FusionError, FusionReport};
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::time::Duration;

const METER_NAME: &str = "gateway";

/// Request and fusion instruments, recorded through the global meter provider.
///
/// Without [`common::TelemetryGuard`] the global provider is a no-op.
#[derive(Clone)]
pub struct GatewayMetrics {
    requests: Counter<u64>,
    request_duration: Histogram<f64>,
    detections: Counter<u64>,
    suppressed: Counter<u64>,
    detector_failures: Counter<u64>,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        let meter = global::meter(METER_NAME);
        let latency_buckets = [
            0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.0, 5.0,
        ];

        Self {
            requests: meter
                .u64_counter("gateway_requests_total")
                .with_description("Detection requests by route and status")
                .build(),
            request_duration: meter
                .f64_histogram("gateway_request_duration_seconds")
                .with_description("Time from request receipt to response, decoding and inference included")
                .with_unit("s")
                .with_boundaries(latency_buckets.to_vec())
                .build(),
            detections: meter
                .u64_counter("gateway_detections_total")
                .with_description("Detections returned after fusion")
                .build(),
            suppressed: meter
                .u64_counter("gateway_suppressed_total")
                .with_description("Cross-model duplicates removed by fusion")
                .build(),
            detector_failures: meter
                .u64_counter("gateway_detector_failures_total")
                .with_description("Detector runs that failed or panicked")
                .build(),
        }
    }

    pub fn record_request(&self, route: &'static str, status: StatusCode, elapsed: Duration) {
        let attributes = [
            KeyValue::new("route", route),
            KeyValue::new("status", i64::from(status.as_u16())),
        ];
        self.requests.add(1, &attributes);
        self.request_duration.record(elapsed.as_secs_f64(), &attributes);
    }

    pub fn record_report(&self, report: &FusionReport) {
        self.detections.add(report.detections.len() as u64, &[]);
        self.suppressed.add(report.suppressed as u64, &[]);
        for model in &report.failed_models {
            self.record_detector_failure(model);
        }
    }

    pub fn record_error(&self, error: &FusionError) {
        for model in failed_detectors(error) {
            match model {
                Some(model) => self.record_detector_failure(model),
                None => self.detector_failures.add(1, &[]),
            }
        }
    }

    fn record_detector_failure(&self, model: &str) {
        self.detector_failures
            .add(1, &[KeyValue::new("model", model.to_string())]);
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// One entry per detector run that failed, with its model when the error names it.
fn failed_detectors(error: &FusionError) -> Vec<Option<&str>> {
    match error {
        FusionError::Detector(err) if !err.is_configuration() => vec![err.model()],
        FusionError::AllDetectorsFailed { models } => {
            models.iter().map(|model| Some(model.as_str())).collect()
        }
        _ => Vec::new(),
    }
}
