pub mod adapter;
pub mod backend;
pub mod errors;
pub mod processing;
pub mod types;

// Re-export commonly used types for convenience
pub use adapter::DetectorAdapter;
pub use backend::Detector;
pub use errors::DetectorError;
pub use types::{BoundingBox, Detection, DetectionBatch, RawDetection};
