use detector::DetectorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FusionError {
    #[error("IoU threshold {0} is outside [0, 1]")]
    InvalidIouThreshold(f32),

    #[error("At least one detector is required")]
    NoDetectors,

    #[error(transparent)]
    Detector(#[from] DetectorError),

    #[error("All detectors failed: {}", .models.join(", "))]
    AllDetectorsFailed { models: Vec<String> },
}

impl FusionError {
    /// Errors caused by the service setup rather than the request.
    pub fn is_configuration(&self) -> bool {
        match self {
            FusionError::InvalidIouThreshold(_) | FusionError::NoDetectors => true,
            FusionError::Detector(err) => err.is_configuration(),
            FusionError::AllDetectorsFailed { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            FusionError::InvalidIouThreshold(1.5).to_string(),
            "IoU threshold 1.5 is outside [0, 1]"
        );

        let all = FusionError::AllDetectorsFailed {
            models: vec!["model1".into(), "model2".into()],
        };
        assert_eq!(all.to_string(), "All detectors failed: model1, model2");
        assert!(!all.is_configuration());
    }

    #[test]
    fn test_detector_error_is_transparent() {
        let err = FusionError::from(DetectorError::Panicked {
            model: "model2".into(),
        });
        assert_eq!(
            err.to_string(),
            DetectorError::Panicked {
                model: "model2".into()
            }
            .to_string()
        );
    }
}
