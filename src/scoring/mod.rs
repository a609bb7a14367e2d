//! Shared plumbing for the two model-backed scorers.
//!
//! Model inference is synchronous CPU/GPU work. [`run_blocking`] moves it onto
//! tokio's blocking pool and bounds it with a deadline, so a hung model shows
//! up as [`ScoringError::TimedOut`] instead of stalling the request.

pub mod error;

pub use error::ScoringError;

use std::time::Duration;

use tracing::warn;

/// Runs `f` on the blocking pool, failing with [`ScoringError::TimedOut`] after `timeout`.
///
/// On timeout the blocking task keeps running to completion in the background;
/// its result is discarded.
pub async fn run_blocking<T, F>(timeout: Duration, f: F) -> Result<T, ScoringError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ScoringError> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(f);

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => {
            warn!(error = %join_err, "Scoring task failed");
            Err(ScoringError::unavailable(format!(
                "scoring task aborted: {}",
                join_err
            )))
        }
        Err(_) => {
            warn!(?timeout, "Scoring deadline exceeded");
            Err(ScoringError::TimedOut { after: timeout })
        }
    }
}
