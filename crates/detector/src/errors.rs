use thiserror::Error;
use vocabulary::VocabularyError;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Detector {model} failed: {source:#}")]
    Inference {
        model: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Detector {model} panicked")]
    Panicked { model: String },

    #[error("Confidence threshold {0} is outside [0, 1]")]
    InvalidConfidenceThreshold(f32),

    #[error("Class mapping error: {0}")]
    Mapping(#[from] VocabularyError),

    #[error("Detector {model} predicts {reported} classes but its class names list {mapped}")]
    ClassCountMismatch {
        model: String,
        reported: usize,
        mapped: usize,
    },
}

impl DetectorError {
    /// Errors caused by a model/class-file mismatch rather than a failing call.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DetectorError::Mapping(_)
                | DetectorError::InvalidConfidenceThreshold(_)
                | DetectorError::ClassCountMismatch { .. }
        )
    }

    /// Model the error belongs to, when known.
    pub fn model(&self) -> Option<&str> {
        match self {
            DetectorError::Inference { model, .. }
            | DetectorError::Panicked { model }
            | DetectorError::ClassCountMismatch { model, .. }
            | DetectorError::Mapping(VocabularyError::UnmappedClass { model, .. }) => Some(model),
            DetectorError::Mapping(_) | DetectorError::InvalidConfidenceThreshold(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formatting() {
        let err = DetectorError::Inference {
            model: "model2".to_string(),
            source: anyhow::anyhow!("session run failed").context("predict"),
        };
        assert_eq!(
            err.to_string(),
            "Detector model2 failed: predict: session run failed"
        );

        let err = DetectorError::Panicked {
            model: "model1".to_string(),
        };
        assert_eq!(err.to_string(), "Detector model1 panicked");

        let err = DetectorError::InvalidConfidenceThreshold(1.5);
        assert_eq!(err.to_string(), "Confidence threshold 1.5 is outside [0, 1]");
    }

    #[test]
    fn test_mapping_errors_are_configuration_errors() {
        let err: DetectorError = VocabularyError::UnmappedClass {
            model: "m".to_string(),
            index: 3,
            len: 2,
        }
        .into();
        assert!(err.is_configuration());

        let err = DetectorError::Panicked {
            model: "m".to_string(),
        };
        assert!(!err.is_configuration());

        let err = DetectorError::ClassCountMismatch {
            model: "m".to_string(),
            reported: 80,
            mapped: 2,
        };
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "Detector m predicts 80 classes but its class names list 2"
        );
    }

    #[test]
    fn test_model_name_is_exposed() {
        let err = DetectorError::Inference {
            model: "model2".to_string(),
            source: anyhow::anyhow!("boom"),
        };
        assert_eq!(err.model(), Some("model2"));

        let err: DetectorError = VocabularyError::UnmappedClass {
            model: "model1".to_string(),
            index: 9,
            len: 2,
        }
        .into();
        assert_eq!(err.model(), Some("model1"));

        assert_eq!(DetectorError::InvalidConfidenceThreshold(2.0).model(), None);
    }
}
