//! Cross-model fusion of detector outputs.
//!
//! [`fuse`] merges batches with greedy, confidence-first, per-label duplicate
//! suppression. [`FusionEngine`] runs every configured detector on an image and
//! fuses what they return.

pub mod dedup;
pub mod engine;
pub mod errors;
pub mod iou;

pub use dedup::{Fused, IouThreshold, fuse, fuse_with};
pub use engine::{Execution, FailurePolicy, FusionEngine, FusionReport};
pub use errors::FusionError;
pub use iou::iou;
