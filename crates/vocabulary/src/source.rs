use crate::errors::VocabularyError;
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level `names` key of a dataset description file (e.g. Ultralytics `data.yaml`).
#[derive(Deserialize)]
struct DatasetFile {
    names: ClassNames,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClassNames {
    List(Vec<String>),
    Indexed(BTreeMap<String, String>),
}

/// Load one model's class names, index = local class index.
///
/// The format follows the file extension (`.yaml`, `.yml`, `.json`, `.toml`).
/// `names` may be a sequence or an `index: name` mapping; a mapping must cover
/// every index from 0 without gaps.
pub fn load_class_names(path: impl AsRef<Path>) -> Result<Vec<String>, VocabularyError> {
    let path = path.as_ref();
    let names = read(path, File::from(path))?;
    tracing::debug!(path = %path.display(), classes = names.len(), "Loaded class names");
    Ok(names)
}

/// Parse class names from an in-memory document.
pub fn parse_class_names(
    contents: &str,
    format: FileFormat,
) -> Result<Vec<String>, VocabularyError> {
    read(Path::new("<inline>"), File::from_str(contents, format))
}

fn read<S>(path: &Path, source: S) -> Result<Vec<String>, VocabularyError>
where
    S: config::Source + Send + Sync + 'static,
{
    let source_error = |source| VocabularyError::Source {
        path: path.to_path_buf(),
        source,
    };

    let file: DatasetFile = Config::builder()
        .add_source(source)
        .build()
        .and_then(|config| config.try_deserialize())
        .map_err(source_error)?;

    match file.names {
        ClassNames::List(names) => Ok(names),
        ClassNames::Indexed(entries) => contiguous(path.to_path_buf(), entries),
    }
}

fn contiguous(
    path: PathBuf,
    entries: BTreeMap<String, String>,
) -> Result<Vec<String>, VocabularyError> {
    let mut by_index = BTreeMap::new();
    for (key, name) in entries {
        let index: usize = key
            .trim()
            .parse()
            .map_err(|_| VocabularyError::InvalidIndexKey {
                path: path.clone(),
                key: key.clone(),
            })?;
        by_index.insert(index, name);
    }

    let mut names = Vec::with_capacity(by_index.len());
    for (expected, (index, name)) in by_index.into_iter().enumerate() {
        if index != expected {
            return Err(VocabularyError::MissingIndex {
                path,
                index: expected,
            });
        }
        names.push(name);
    }
    Ok(names)
}
