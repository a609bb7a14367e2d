use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use super::ToxicityClassifier;
use super::error::ClassifierError;

/// Score returned for text that matches no rule.
pub const MOCK_CLEAN_SCORE: f32 = 0.01;

/// Classifier with scripted answers.
///
/// The first rule whose substring occurs in the text (case-insensitive) wins
/// and its scores are returned verbatim; anything else scores
/// `{"toxicity": 0.01}`.
#[derive(Debug, Default)]
pub struct MockToxicityClassifier {
    rules: Vec<(String, BTreeMap<String, f32>)>,
    fail: AtomicBool,
    latency_ms: AtomicUsize,
    calls: AtomicUsize,
}

impl MockToxicityClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, needle: &str, scores: &[(&str, f32)]) -> Self {
        self.rules.push((
            needle.to_lowercase(),
            scores.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        ));
        self
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as usize, Ordering::SeqCst);
    }

    /// Number of `predict` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ToxicityClassifier for MockToxicityClassifier {
    fn predict(&self, text: &str) -> Result<BTreeMap<String, f32>, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            std::thread::sleep(Duration::from_millis(latency as u64));
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClassifierError::InferenceFailed {
                reason: "mock classifier failure".to_string(),
            });
        }

        let lowered = text.to_lowercase();
        let scores = self
            .rules
            .iter()
            .find(|(needle, _)| lowered.contains(needle.as_str()))
            .map(|(_, scores)| scores.clone())
            .unwrap_or_else(|| BTreeMap::from([("toxicity".to_string(), MOCK_CLEAN_SCORE)]));

        Ok(scores)
    }

    fn is_stub(&self) -> bool {
        true
    }
}
