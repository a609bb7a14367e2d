//! Deterministic hashing embedder used when no model is configured.

use std::collections::HashSet;
use std::sync::LazyLock;

use tracing::debug;

use super::Embedder;
use super::error::EmbeddingError;
use super::similarity::normalize;
use crate::hashing::token_bucket;

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has",
        "had", "do", "does", "did", "will", "would", "could", "should", "may", "might", "must",
        "can", "to", "of", "in", "for", "on", "with", "at", "by", "from", "as", "into", "about",
        "how", "what", "which", "who", "why", "when", "where", "and", "but", "if", "or", "so",
        "than", "too", "very", "just", "this", "that", "these", "those", "it", "its", "i", "me",
        "my", "we", "our", "you", "your", "he", "she", "they", "them", "there", "here", "any",
        "some", "such", "no", "not", "only", "like", "including", "s", "t",
    ]
    .into_iter()
    .collect()
});

/// Splits text into lower-cased content words.
pub fn content_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Feature-hashing bag-of-words embedder.
///
/// Texts that share content words get a positive cosine similarity, unrelated
/// texts land near zero. Good enough to run the whole pipeline without model
/// files; not a substitute for a real sentence model.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let tokens = content_tokens(text);
        debug!(
            text_len = text.len(),
            tokens = tokens.len(),
            "Generating stub embedding"
        );

        let mut embedding = vec![0.0f32; self.dim];
        // Each distinct word counts once so long descriptions aren't dominated
        // by repeated filler terms.
        let distinct: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        for token in distinct {
            let (bucket, sign) = token_bucket(token, self.dim);
            embedding[bucket] += sign;
        }

        Ok(normalize(embedding))
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_stub(&self) -> bool {
        true
    }
}
