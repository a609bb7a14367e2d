//! Sentence embeddings for the relevance scorer.
//!
//! - [`SentenceEmbedder`] runs a BERT sentence model on candle.
//! - [`HashingEmbedder`] is the deterministic stand-in used without model files.

/// BERT encoders (sentence pooling and multi-label classification).
pub mod bert;
pub mod config;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
/// Once-only model initialisation.
pub mod lazy;
#[cfg(any(test, feature = "mock"))]
mod mock;
pub mod sentence;
pub mod similarity;
pub mod stub;
/// Tokenizer/model loading helpers.
pub mod utils;


pub use config::{DEFAULT_STUB_DIM, EmbedderConfig};
pub use error::EmbeddingError;
pub use lazy::LazyModel;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
pub use sentence::SentenceEmbedder;
pub use similarity::cosine_similarity;
pub use stub::HashingEmbedder;

use std::sync::Arc;

use tracing::warn;

/// Maps text to a dense, L2-normalised vector.
///
/// Implementations are synchronous; async callers go through
/// [`crate::scoring::run_blocking`].
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize;

    fn is_stub(&self) -> bool {
        false
    }
}

/// Builds the embedder described by `config` (stub or real model).
pub fn build_embedder(config: EmbedderConfig) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    config.validate()?;
    if config.testing_stub {
        warn!(
            dim = config.stub_dim,
            "Using STUB hashing embedder (no sentence model configured)"
        );
        return Ok(Arc::new(HashingEmbedder::new(config.stub_dim)));
    }
    Ok(Arc::new(SentenceEmbedder::new(config)?))
}
