use std::path::PathBuf;
use thiserror::Error;

/// Failures of the sentence encoder. All of them surface to callers as
/// [`ScoringError::Unavailable`](crate::scoring::ScoringError).
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("sentence encoder files missing at {path}")]
    ModelNotFound { path: PathBuf },

    #[error("could not load sentence encoder: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("sentence encoding failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("could not tokenize text: {reason}")]
    TokenizationFailed { reason: String },

    #[error("bad encoder config: {reason}")]
    InvalidConfig { reason: String },

    #[error("vectors differ in length ({left} vs {right})")]
    DimensionMismatch { left: usize, right: usize },
}

impl From<candle_core::Error> for EmbeddingError {
    fn from(err: candle_core::Error) -> Self {
        EmbeddingError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for EmbeddingError {
    fn from(err: std::io::Error) -> Self {
        EmbeddingError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}
