use std::time::Duration;

use thiserror::Error;

/// Failure of an external scorer (toxicity classifier or embedding model).
///
/// Every variant means "no verdict". Callers must never turn one into a pass
/// or a fail.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("scoring backend unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("scoring timed out after {after:?}")]
    TimedOut { after: Duration },

    #[error("invalid scoring input: {reason}")]
    InvalidInput { reason: String },
}

impl ScoringError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// `true` when the same call may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::TimedOut { .. })
    }
}
