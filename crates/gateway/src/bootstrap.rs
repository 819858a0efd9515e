use crate::config::{Config, ModelConfig};
use crate::state::AppState;
use anyhow::Context;
use detector::{Detector, DetectorAdapter};
use fusion::FusionEngine;
use vocabulary::{Vocabulary, load_class_names};

/// Load every configured model and assemble the shared state.
///
/// Any failure here is a startup failure; nothing is served half-configured.
pub fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let vocabulary = load_vocabulary(&config.models)?;

    let detectors = config
        .models
        .iter()
        .map(load_detector)
        .collect::<anyhow::Result<Vec<_>>>()?;

    assemble_state(config, vocabulary, detectors)
}

/// Build the unified vocabulary from each model's class-name file, in model order.
pub fn load_vocabulary(models: &[ModelConfig]) -> anyhow::Result<Vocabulary> {
    let named = models
        .iter()
        .map(|model| {
            load_class_names(&model.class_names_path)
                .with_context(|| format!("Failed to load class names for model {}", model.name))
                .map(|names| (model.name.clone(), names))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(Vocabulary::init(named))
}

/// Wire detectors to their index maps. `detectors` must follow `config.models` order.
pub fn assemble_state(
    config: &Config,
    vocabulary: Vocabulary,
    detectors: Vec<Box<dyn Detector>>,
) -> anyhow::Result<AppState> {
    if detectors.len() != config.models.len() {
        anyhow::bail!(
            "Expected {} detectors, got {}",
            config.models.len(),
            detectors.len()
        );
    }

    let (classes, maps) = vocabulary.into_parts();

    let adapters = config
        .models
        .iter()
        .zip(maps)
        .zip(detectors)
        .map(|((model, map), detector)| {
            DetectorAdapter::new(detector, model.confidence_threshold, map, classes.clone())
                .with_context(|| format!("Invalid settings for model {}", model.name))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let engine = FusionEngine::new(
        adapters,
        config.iou_threshold,
        config.failure_policy,
        config.execution,
    )?;

    Ok(AppState::new(engine, classes, config.max_body_bytes))
}

#[cfg(feature = "ort-backend")]
fn load_detector(model: &ModelConfig) -> anyhow::Result<Box<dyn Detector>> {
    use detector::backend::ort::OrtYoloBackend;

    let path = model
        .model_path
        .to_str()
        .with_context(|| format!("Model path for {} is not valid UTF-8", model.name))?;

    tracing::info!(model = %model.name, path, input_size = model.input_size, "Loading detector");
    let backend = OrtYoloBackend::load_model(path, model.input_size)
        .with_context(|| format!("Failed to load model {}", model.name))?;

    Ok(Box::new(backend))
}

#[cfg(not(feature = "ort-backend"))]
fn load_detector(model: &ModelConfig) -> anyhow::Result<Box<dyn Detector>> {
    anyhow::bail!(
        "Cannot load model {}: built without a detector backend",
        model.name
    )
}
