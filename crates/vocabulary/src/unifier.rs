use crate::errors::VocabularyError;
use std::collections::HashMap;
use std::sync::Arc;

/// Ordered set of unique labels shared by every model.
///
/// Labels are compared by exact string equality: `"car"` and `"Car"` are two
/// distinct classes.
#[derive(Debug, Clone, Default)]
pub struct ClassVocabulary {
    labels: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ClassVocabulary {
    fn insert(&mut self, label: &str) -> usize {
        if let Some(&index) = self.positions.get(label) {
            return index;
        }
        let index = self.labels.len();
        self.labels.push(label.to_string());
        self.positions.insert(label.to_string(), index);
        index
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, index: usize) -> Result<&str, VocabularyError> {
        self.labels
            .get(index)
            .map(String::as_str)
            .ok_or(VocabularyError::UnknownUnifiedIndex(index))
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.positions.get(label).copied()
    }
}

/// Total mapping from one model's local class index to the unified index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassIndexMap {
    model: String,
    unified: Vec<usize>,
}

impl ClassIndexMap {
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Number of local classes the model was configured with.
    pub fn len(&self) -> usize {
        self.unified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unified.is_empty()
    }

    /// Unified index for `local`, indexed by local class index.
    pub fn as_slice(&self) -> &[usize] {
        &self.unified
    }

    pub fn resolve(&self, local: usize) -> Result<usize, VocabularyError> {
        self.unified
            .get(local)
            .copied()
            .ok_or_else(|| VocabularyError::UnmappedClass {
                model: self.model.clone(),
                index: local,
                len: self.unified.len(),
            })
    }
}

/// Immutable result of unifying every model's class names.
///
/// Built once at startup; the vocabulary sits behind an `Arc` so adapters on
/// any thread read it without locking.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    classes: Arc<ClassVocabulary>,
    maps: Vec<ClassIndexMap>,
}

impl Vocabulary {
    /// Unify `(model name, class names)` lists.
    ///
    /// Labels are numbered in first-seen order: lists in the given order, names
    /// within a list in local index order. Identical input always yields
    /// identical indices. One [`ClassIndexMap`] is returned per list, in input
    /// order; an empty list yields an empty map.
    pub fn init<M, N>(models: impl IntoIterator<Item = (M, Vec<N>)>) -> Self
    where
        M: Into<String>,
        N: AsRef<str>,
    {
        let mut classes = ClassVocabulary::default();
        let mut maps = Vec::new();

        for (model, names) in models {
            let unified = names
                .iter()
                .map(|name| classes.insert(name.as_ref()))
                .collect();
            maps.push(ClassIndexMap {
                model: model.into(),
                unified,
            });
        }

        tracing::info!(
            vocabulary_size = classes.len(),
            models = maps.len(),
            "Class vocabulary unified"
        );
        for map in &maps {
            tracing::debug!(model = %map.model, local_classes = map.len(), mapping = ?map.unified, "Class index map");
        }

        Self {
            classes: Arc::new(classes),
            maps,
        }
    }

    pub fn classes(&self) -> &Arc<ClassVocabulary> {
        &self.classes
    }

    pub fn maps(&self) -> &[ClassIndexMap] {
        &self.maps
    }

    pub fn map_for(&self, model: &str) -> Option<&ClassIndexMap> {
        self.maps.iter().find(|m| m.model == model)
    }

    pub fn into_parts(self) -> (Arc<ClassVocabulary>, Vec<ClassIndexMap>) {
        (self.classes, self.maps)
    }
}
