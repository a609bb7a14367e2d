use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    ConfigError, check_threshold, flag_from_env, optional_path_from_env, parse_or_default,
    secs_from_env,
};
use crate::constants::{
    CLASSIFIER_MAX_SEQ_LEN, DEFAULT_CATEGORY_THRESHOLD, DEFAULT_MAX_SCORED_CHARS,
    DEFAULT_SCORING_TIMEOUT_SECS, DEFAULT_TOXICITY_THRESHOLD,
};

/// Toxicity scorer settings.
#[derive(Debug, Clone)]
pub struct ToxicityConfig {
    /// Classifier directory (`config.json`, `model.safetensors`, `tokenizer.json`).
    pub model_path: Option<PathBuf>,
    /// "toxicity" score strictly above this is a violation.
    pub threshold: f32,
    /// Other categories above this are reported as offending.
    pub category_threshold: f32,
    /// Characters handed to the classifier; longer text is truncated.
    pub max_chars: usize,
    /// Tokens per classifier pass.
    pub max_seq_len: usize,
    /// Deadline for one classification.
    pub timeout: Duration,
    /// Use the built-in lexicon classifier instead of a model.
    pub testing_stub: bool,
}

impl Default for ToxicityConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            threshold: DEFAULT_TOXICITY_THRESHOLD,
            category_threshold: DEFAULT_CATEGORY_THRESHOLD,
            max_chars: DEFAULT_MAX_SCORED_CHARS,
            max_seq_len: CLASSIFIER_MAX_SEQ_LEN,
            timeout: Duration::from_secs(DEFAULT_SCORING_TIMEOUT_SECS),
            testing_stub: false,
        }
    }
}

impl ToxicityConfig {
    pub const ENV_MODEL_PATH: &'static str = "ASKSPHERE_TOXICITY_MODEL_PATH";
    pub const ENV_THRESHOLD: &'static str = "ASKSPHERE_TOXICITY_THRESHOLD";
    pub const ENV_CATEGORY_THRESHOLD: &'static str = "ASKSPHERE_TOXICITY_CATEGORY_THRESHOLD";
    pub const ENV_MAX_CHARS: &'static str = "ASKSPHERE_TOXICITY_MAX_CHARS";
    pub const ENV_TIMEOUT_SECS: &'static str = "ASKSPHERE_TOXICITY_TIMEOUT_SECS";
    pub const ENV_STUB: &'static str = "ASKSPHERE_TOXICITY_STUB";

    /// Loads from environment variables. No model path means stub mode.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let model_path = optional_path_from_env(Self::ENV_MODEL_PATH);
        let testing_stub = model_path.is_none() || flag_from_env(Self::ENV_STUB);

        Self {
            model_path,
            threshold: parse_or_default(Self::ENV_THRESHOLD, defaults.threshold),
            category_threshold: parse_or_default(
                Self::ENV_CATEGORY_THRESHOLD,
                defaults.category_threshold,
            ),
            max_chars: parse_or_default(Self::ENV_MAX_CHARS, defaults.max_chars),
            timeout: secs_from_env(Self::ENV_TIMEOUT_SECS, defaults.timeout),
            testing_stub,
            ..defaults
        }
    }

    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            ..Default::default()
        }
    }

    /// Checks everything except the model path.
    pub fn validate_limits(&self) -> Result<(), ConfigError> {
        check_threshold("toxicity threshold", self.threshold, 0.0..=1.0)?;
        check_threshold(
            "toxicity category threshold",
            self.category_threshold,
            0.0..=1.0,
        )?;
        if self.max_chars == 0 {
            return Err(ConfigError::MustBePositive {
                name: "toxicity max_chars",
            });
        }
        if self.max_seq_len == 0 {
            return Err(ConfigError::MustBePositive {
                name: "toxicity max_seq_len",
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::MustBePositive {
                name: "toxicity timeout",
            });
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_limits()?;
        if !self.testing_stub {
            match &self.model_path {
                None => {
                    return Err(ConfigError::Missing {
                        name: "toxicity model_path",
                    });
                }
                Some(path) if !path.is_dir() => {
                    return Err(ConfigError::NotADirectory { path: path.clone() });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
