use std::path::PathBuf;
use thiserror::Error;

/// Failure inside a toxicity classifier backend.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("toxicity model not found at path: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load toxicity model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("toxicity inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },
}

impl From<candle_core::Error> for ClassifierError {
    fn from(err: candle_core::Error) -> Self {
        ClassifierError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}
