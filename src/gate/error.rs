use thiserror::Error;

use super::outcome::ErrorKind;
use crate::ids::CommunityId;
use crate::ledger::LedgerError;
use crate::relevance::AdvisorError;
use crate::scoring::ScoringError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("invalid submission: {reason}")]
    InvalidSubmission { reason: String },

    #[error("community not found: {0}")]
    CommunityNotFound(CommunityId),

    #[error("scoring unavailable: {0}")]
    ScoringUnavailable(#[source] ScoringError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("community store error: {0}")]
    Store(#[from] StoreError),
}

impl ModerationError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ModerationError::InvalidSubmission {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ModerationError::InvalidSubmission { .. } => ErrorKind::InvalidSubmission,
            ModerationError::CommunityNotFound(_) => ErrorKind::CommunityNotFound,
            ModerationError::ScoringUnavailable(_) => ErrorKind::ScoringUnavailable,
            ModerationError::Ledger(_) | ModerationError::Store(_) => ErrorKind::Storage,
        }
    }

    /// Whether the same submission may succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            ModerationError::ScoringUnavailable(e) => e.is_retryable(),
            ModerationError::Ledger(_) | ModerationError::Store(_) => true,
            ModerationError::InvalidSubmission { .. } | ModerationError::CommunityNotFound(_) => {
                false
            }
        }
    }
}

impl From<ScoringError> for ModerationError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::InvalidInput { reason } => ModerationError::InvalidSubmission { reason },
            other => ModerationError::ScoringUnavailable(other),
        }
    }
}

impl From<AdvisorError> for ModerationError {
    fn from(err: AdvisorError) -> Self {
        match err {
            AdvisorError::CommunityNotFound(id) => ModerationError::CommunityNotFound(id),
            AdvisorError::Scoring(e) => e.into(),
            AdvisorError::Store(e) => ModerationError::Store(e),
        }
    }
}
