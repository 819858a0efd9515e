use anyhow::Context;
use fusion::{Execution, FailurePolicy};
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;

pub use common::{Environment, LogLevel};

pub const CONFIG_PATH_VAR: &str = "GATEWAY_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config/gateway";
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
const DEFAULT_INPUT_SIZE: u32 = 640;

/// One detector: an ONNX model and the class-name file describing its output indices.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    pub model_path: PathBuf,
    pub class_names_path: PathBuf,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    #[serde(default = "default_input_size")]
    pub input_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub log_level: LogLevel,
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub iou_threshold: f32,
    pub failure_policy: FailurePolicy,
    pub execution: Execution,
    pub max_body_bytes: usize,
    pub otel_endpoint: Option<String>,
    /// Model order is significant: it fixes unified class indices and fusion tie-breaks.
    #[serde(default = "default_models")]
    pub models: Vec<ModelConfig>,
}

impl Config {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Checks that need no file access. Thresholds are checked where they are used.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.models.is_empty() {
            anyhow::bail!("No models configured");
        }

        let mut seen = HashSet::new();
        for model in &self.models {
            if !seen.insert(model.name.as_str()) {
                anyhow::bail!("Model name {} is configured more than once", model.name);
            }
            if model.input_size == 0 {
                anyhow::bail!("Model {} has input_size 0", model.name);
            }
        }

        Ok(())
    }
}

fn default_confidence_threshold() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_input_size() -> u32 {
    DEFAULT_INPUT_SIZE
}

fn default_models() -> Vec<ModelConfig> {
    (1..=2)
        .map(|i| ModelConfig {
            name: format!("model{i}"),
            model_path: PathBuf::from(format!("models/best{i}.onnx")),
            class_names_path: PathBuf::from(format!("models/data{i}.yaml")),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            input_size: DEFAULT_INPUT_SIZE,
        })
        .collect()
}

/// Load configuration from defaults, the optional file named by
/// `GATEWAY_CONFIG_PATH` and `GATEWAY_*` environment variables, in that order.
pub fn get_configuration() -> anyhow::Result<Config> {
    let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_configuration(&path)
}

pub fn load_configuration(path: &str) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .set_default("log_level", "info")?
        .set_default("environment", "development")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8000)?
        .set_default("iou_threshold", 0.5)?
        .set_default("failure_policy", "fail_request")?
        .set_default("execution", "parallel")?
        .set_default("max_body_bytes", 16 * 1024 * 1024)?
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("GATEWAY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("Failed to read configuration from {path}"))?;

    let config: Config = config
        .try_deserialize()
        .context("Invalid gateway configuration")?;
    config.validate()?;

    Ok(config)
}
