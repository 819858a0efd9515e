use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VocabularyError {
    #[error("Failed to load class names from {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },

    #[error("Class index key `{key}` in {path} is not a non-negative integer")]
    InvalidIndexKey { path: PathBuf, key: String },

    #[error("Class names in {path} skip index {index}")]
    MissingIndex { path: PathBuf, index: usize },

    #[error("Local class index {index} is not mapped for model {model} ({len} classes)")]
    UnmappedClass {
        model: String,
        index: usize,
        len: usize,
    },

    #[error("Unified class index {0} is outside the vocabulary")]
    UnknownUnifiedIndex(usize),
}
