//! Toxicity scoring.
//!
//! [`ToxicityScorer`] wraps a [`ToxicityClassifier`] backend: it bounds the
//! input, runs inference off the async executor under a deadline and checks
//! the output before anyone acts on it. A backend failure is always a
//! [`ScoringError`], never a verdict.

pub mod config;
pub mod detoxify;
mod error;
pub mod lexicon;
#[cfg(any(test, feature = "mock"))]
mod mock;


pub use config::ToxicityConfig;
pub use detoxify::{DEFAULT_LABELS, DetoxifyClassifier};
pub use error::ClassifierError;
pub use lexicon::LexiconClassifier;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MOCK_CLEAN_SCORE, MockToxicityClassifier};

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ConfigError;
use crate::scoring::{ScoringError, run_blocking};
use crate::text::truncate_chars;

/// Category every verdict must carry.
pub const TOXICITY_CATEGORY: &str = "toxicity";

/// Opaque toxicity model: text in, per-category severity out.
pub trait ToxicityClassifier: Send + Sync {
    fn predict(&self, text: &str) -> Result<BTreeMap<String, f32>, ClassifierError>;

    fn is_stub(&self) -> bool {
        false
    }
}

/// Builds the classifier described by `config` (lexicon stub or model).
pub fn build_classifier(
    config: &ToxicityConfig,
) -> Result<Arc<dyn ToxicityClassifier>, ClassifierError> {
    match (&config.model_path, config.testing_stub) {
        (Some(path), false) => Ok(Arc::new(DetoxifyClassifier::new(
            path.clone(),
            config.max_seq_len,
        )?)),
        _ => {
            warn!("Using STUB lexicon toxicity classifier (no model configured)");
            Ok(Arc::new(LexiconClassifier::new()))
        }
    }
}

/// Per-category severities for one text. Always contains "toxicity".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToxicityVerdict {
    scores: BTreeMap<String, f32>,
}

impl ToxicityVerdict {
    /// Accepts classifier output only if it has a "toxicity" score and every
    /// score is a number in `[0, 1]`.
    pub fn from_scores(scores: BTreeMap<String, f32>) -> Result<Self, ScoringError> {
        if !scores.contains_key(TOXICITY_CATEGORY) {
            return Err(ScoringError::unavailable(
                "classifier output has no toxicity score",
            ));
        }
        if let Some((category, score)) = scores
            .iter()
            .find(|(_, s)| !(0.0..=1.0).contains(*s))
        {
            return Err(ScoringError::unavailable(format!(
                "classifier returned {} = {} outside [0, 1]",
                category, score
            )));
        }
        Ok(Self { scores })
    }

    pub fn toxicity(&self) -> f32 {
        self.scores
            .get(TOXICITY_CATEGORY)
            .copied()
            .unwrap_or_default()
    }

    pub fn score(&self, category: &str) -> Option<f32> {
        self.scores.get(category).copied()
    }

    pub fn scores(&self) -> &BTreeMap<String, f32> {
        &self.scores
    }
}

/// Async wrapper around a toxicity classifier.
#[derive(Clone)]
pub struct ToxicityScorer {
    classifier: Arc<dyn ToxicityClassifier>,
    config: ToxicityConfig,
}

impl std::fmt::Debug for ToxicityScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToxicityScorer")
            .field("config", &self.config)
            .field("stub", &self.classifier.is_stub())
            .finish()
    }
}

impl ToxicityScorer {
    pub fn new(
        classifier: Arc<dyn ToxicityClassifier>,
        config: ToxicityConfig,
    ) -> Result<Self, ConfigError> {
        config.validate_limits()?;
        Ok(Self { classifier, config })
    }

    /// Scores `text`. Blank input is rejected before the model is touched.
    pub async fn score(&self, text: &str) -> Result<ToxicityVerdict, ScoringError> {
        if text.trim().is_empty() {
            return Err(ScoringError::InvalidInput {
                reason: "text is empty".to_string(),
            });
        }

        let bounded = truncate_chars(text, self.config.max_chars);
        if bounded.len() < text.len() {
            debug!(
                original_len = text.len(),
                max_chars = self.config.max_chars,
                "Truncated text before toxicity scoring"
            );
        }

        let classifier = Arc::clone(&self.classifier);
        let input = bounded.to_string();
        let scores = run_blocking(self.config.timeout, move || {
            classifier
                .predict(&input)
                .map_err(|e| ScoringError::unavailable(e.to_string()))
        })
        .await?;

        let verdict = ToxicityVerdict::from_scores(scores)?;
        debug!(
            toxicity = verdict.toxicity(),
            categories = verdict.scores().len(),
            "Toxicity scored"
        );
        Ok(verdict)
    }

    pub fn threshold(&self) -> f32 {
        self.config.threshold
    }

    /// Strictly above the threshold is toxic; equal to it is clean.
    pub fn is_toxic(&self, verdict: &ToxicityVerdict) -> bool {
        verdict.toxicity() > self.config.threshold
    }

    /// "toxicity" first, then other categories above the category threshold,
    /// highest score first.
    pub fn offending_categories(&self, verdict: &ToxicityVerdict) -> Vec<String> {
        let mut others: Vec<(&String, f32)> = verdict
            .scores()
            .iter()
            .filter(|(name, score)| {
                name.as_str() != TOXICITY_CATEGORY && **score > self.config.category_threshold
            })
            .map(|(name, score)| (name, *score))
            .collect();
        others.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut categories = Vec::with_capacity(others.len() + 1);
        if self.is_toxic(verdict) {
            categories.push(TOXICITY_CATEGORY.to_string());
        }
        categories.extend(others.into_iter().map(|(name, _)| name.clone()));
        categories
    }

    pub fn is_stub(&self) -> bool {
        self.classifier.is_stub()
    }

    pub fn config(&self) -> &ToxicityConfig {
        &self.config
    }
}
