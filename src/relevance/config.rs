use std::time::Duration;

use crate::config::{ConfigError, check_threshold, parse_or_default, secs_from_env};
use crate::constants::{
    DEFAULT_MAX_SIMILAR_QUESTIONS, DEFAULT_REFERENCE_CACHE_CAPACITY, DEFAULT_RELEVANCE_THRESHOLD,
    DEFAULT_SCORING_TIMEOUT_SECS, DEFAULT_SIMILAR_QUESTION_THRESHOLD, DEFAULT_SNIPPET_CHARS,
};

/// Relevance scorer and advisor settings.
#[derive(Debug, Clone)]
pub struct RelevanceConfig {
    /// Similarity at or above which a text fits its community.
    pub relevance_threshold: f32,
    /// Similarity at or above which an existing question is surfaced.
    pub similar_question_threshold: f32,
    pub max_similar_questions: usize,
    /// Characters of question body in a similar-question snippet.
    pub snippet_chars: usize,
    /// Community reference embeddings kept in memory.
    pub reference_cache_capacity: u64,
    /// Deadline for one embedding call.
    pub timeout: Duration,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            similar_question_threshold: DEFAULT_SIMILAR_QUESTION_THRESHOLD,
            max_similar_questions: DEFAULT_MAX_SIMILAR_QUESTIONS,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
            reference_cache_capacity: DEFAULT_REFERENCE_CACHE_CAPACITY,
            timeout: Duration::from_secs(DEFAULT_SCORING_TIMEOUT_SECS),
        }
    }
}

impl RelevanceConfig {
    pub const ENV_THRESHOLD: &'static str = "ASKSPHERE_RELEVANCE_THRESHOLD";
    pub const ENV_SIMILAR_THRESHOLD: &'static str = "ASKSPHERE_SIMILAR_QUESTION_THRESHOLD";
    pub const ENV_MAX_SIMILAR: &'static str = "ASKSPHERE_MAX_SIMILAR_QUESTIONS";
    pub const ENV_CACHE_CAPACITY: &'static str = "ASKSPHERE_REFERENCE_CACHE_CAPACITY";
    pub const ENV_TIMEOUT_SECS: &'static str = "ASKSPHERE_RELEVANCE_TIMEOUT_SECS";

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            relevance_threshold: parse_or_default(Self::ENV_THRESHOLD, defaults.relevance_threshold),
            similar_question_threshold: parse_or_default(
                Self::ENV_SIMILAR_THRESHOLD,
                defaults.similar_question_threshold,
            ),
            max_similar_questions: parse_or_default(
                Self::ENV_MAX_SIMILAR,
                defaults.max_similar_questions,
            ),
            reference_cache_capacity: parse_or_default(
                Self::ENV_CACHE_CAPACITY,
                defaults.reference_cache_capacity,
            ),
            timeout: secs_from_env(Self::ENV_TIMEOUT_SECS, defaults.timeout),
            ..defaults
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_threshold("relevance threshold", self.relevance_threshold, -1.0..=1.0)?;
        check_threshold(
            "similar question threshold",
            self.similar_question_threshold,
            -1.0..=1.0,
        )?;
        if self.reference_cache_capacity == 0 {
            return Err(ConfigError::MustBePositive {
                name: "reference cache capacity",
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::MustBePositive {
                name: "relevance timeout",
            });
        }
        Ok(())
    }
}
