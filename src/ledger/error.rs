use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ledger serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("ledger snapshot is corrupt: {reason}")]
    Corrupt { reason: String },

    #[error("ban duration must be at least one day, got {days}")]
    InvalidBanDuration { days: u32 },

    #[error("ledger background task failed: {reason}")]
    Task { reason: String },
}
