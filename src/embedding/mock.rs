use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use super::Embedder;
use super::error::EmbeddingError;
use super::similarity::normalize;

/// Embedder with hand-picked topic axes.
///
/// Every topic is one dimension; a text gets weight on each topic whose
/// keywords it mentions. Texts that mention none of them land on a shared
/// "unknown" axis, which is orthogonal to every topic.
#[derive(Debug, Default)]
pub struct MockEmbedder {
    topics: Vec<(String, Vec<String>)>,
    fail: AtomicBool,
    latency_ms: AtomicUsize,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a topic axis matched by any of `keywords` (case-insensitive substrings).
    pub fn with_topic(mut self, name: &str, keywords: &[&str]) -> Self {
        self.topics.push((
            name.to_string(),
            keywords.iter().map(|k| k.to_lowercase()).collect(),
        ));
        self
    }

    /// Makes every subsequent call fail with `InferenceFailed`.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Sleeps this long inside every call.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as usize, Ordering::SeqCst);
    }

    /// Number of texts embedded so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            std::thread::sleep(Duration::from_millis(latency as u64));
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmbeddingError::InferenceFailed {
                reason: "mock embedder failure".to_string(),
            });
        }

        let lowered = text.to_lowercase();
        let mut embedding = vec![0.0f32; self.dimension()];
        for (axis, (_, keywords)) in self.topics.iter().enumerate() {
            embedding[axis] = keywords
                .iter()
                .filter(|k| lowered.contains(k.as_str()))
                .count() as f32;
        }
        if embedding.iter().all(|v| *v == 0.0) && !lowered.trim().is_empty() {
            let unknown = self.topics.len();
            embedding[unknown] = 1.0;
        }

        Ok(normalize(embedding))
    }

    fn dimension(&self) -> usize {
        self.topics.len() + 1
    }

    fn is_stub(&self) -> bool {
        true
    }
}
