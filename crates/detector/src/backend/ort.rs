use super::{Detector, class_count_from_metadata};
use crate::processing::{post::parse_end_to_end, pre::PreProcessor};
use crate::types::RawDetection;
use anyhow::Context;
use common::span;
use image::RgbImage;
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};

/// Input and output tensor names of an Ultralytics ONNX export.
const INPUT_NAME: &str = "images";
const OUTPUT_NAME: &str = "output0";

#[derive(Debug, Clone, Copy)]
pub enum ExecutionProvider {
    Cpu,
    Cuda,
}

/// YOLO model exported to ONNX with end-to-end NMS, run through ONNX Runtime.
pub struct OrtYoloBackend {
    session: Session,
    preprocessor: PreProcessor,
    num_classes: Option<usize>,
}

impl OrtYoloBackend {
    pub fn load_model(path: &str, input_size: u32) -> anyhow::Result<Self> {
        let provider = if cfg!(feature = "cuda") {
            ExecutionProvider::Cuda
        } else {
            ExecutionProvider::Cpu
        };
        Self::load_model_with_provider(path, input_size, provider)
    }

    /// Load model with specified execution provider
    pub fn load_model_with_provider(
        path: &str,
        input_size: u32,
        provider: ExecutionProvider,
    ) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?;

        let builder = match provider {
            #[cfg(feature = "cuda")]
            ExecutionProvider::Cuda => {
                tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
                builder.with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(0)
                        .build()
                        .error_on_failure(),
                ])?
            }
            #[cfg(not(feature = "cuda"))]
            ExecutionProvider::Cuda => {
                anyhow::bail!("CUDA execution provider requires the `cuda` feature");
            }
            ExecutionProvider::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
                builder
            }
        };

        let session = builder
            .commit_from_file(path)
            .with_context(|| format!("Failed to load ONNX model from {}", path))?;

        let num_classes = session
            .metadata()
            .ok()
            .and_then(|metadata| metadata.custom("names"))
            .and_then(|names| class_count_from_metadata(&names));

        tracing::info!(path, input_size, ?num_classes, "Model loaded");
        Ok(Self {
            session,
            preprocessor: PreProcessor::new(input_size),
            num_classes,
        })
    }
}

impl Detector for OrtYoloBackend {
    fn predict(
        &mut self,
        image: &RgbImage,
        confidence_threshold: f32,
    ) -> anyhow::Result<Vec<RawDetection>> {
        let (input, transform) = self.preprocessor.preprocess(image)?;

        let outputs = {
            let _s = span!("model_inference");
            self.session.run(ort::inputs![
                INPUT_NAME => TensorRef::from_array_view(input.view())?
            ])?
        };

        let output = outputs[OUTPUT_NAME].try_extract_array::<f32>()?;

        parse_end_to_end(&output, confidence_threshold, &transform)
    }

    fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }
}
