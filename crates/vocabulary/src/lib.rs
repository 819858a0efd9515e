//! Shared class vocabulary across independently trained detectors.
//!
//! Each detector numbers its classes locally. [`Vocabulary::init`] unifies the
//! per-model label lists into one [`ClassVocabulary`] and hands back one
//! [`ClassIndexMap`] per model translating local indices into shared ones.

pub mod errors;
pub mod source;
pub mod unifier;

pub use config::FileFormat;
pub use errors::VocabularyError;
pub use source::{load_class_names, parse_class_names};
pub use unifier::{ClassIndexMap, ClassVocabulary, Vocabulary};
