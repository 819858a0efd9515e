use crate::metrics::GatewayMetrics;
use fusion::FusionEngine;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use vocabulary::ClassVocabulary;

/// Shared by every request. The engine and vocabulary are never mutated after startup.
pub struct AppState {
    pub engine: Arc<FusionEngine>,
    pub classes: Arc<ClassVocabulary>,
    pub metrics: GatewayMetrics,
    pub max_body_bytes: usize,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine: FusionEngine, classes: Arc<ClassVocabulary>, max_body_bytes: usize) -> Self {
        Self {
            engine: Arc::new(engine),
            classes,
            metrics: GatewayMetrics::new(),
            max_body_bytes,
            start_time: Instant::now(),
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &self.engine)
            .field("classes", &self.classes.len())
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}
