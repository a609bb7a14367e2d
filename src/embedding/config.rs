use std::path::PathBuf;

use crate::config::{flag_from_env, optional_path_from_env, parse_or_default};
use crate::constants::{DEFAULT_EMBEDDING_DIM, DEFAULT_MAX_SEQ_LEN};
use crate::embedding::error::EmbeddingError;

/// Default dimension of the hashing stub. Wider than MiniLM's 384 to keep
/// bucket collisions between unrelated words rare.
pub const DEFAULT_STUB_DIM: usize = 1024;

#[derive(Debug, Clone)]
/// Configuration for the sentence embedder behind the relevance scorer.
pub struct EmbedderConfig {
    /// Model directory (`config.json`, `model.safetensors`, `tokenizer.json`).
    pub model_path: Option<PathBuf>,
    /// Max tokens considered per text.
    pub max_seq_len: usize,
    /// Expected output dimension of the real model.
    pub embedding_dim: usize,
    /// Output dimension of the hashing stub.
    pub stub_dim: usize,
    /// If true, use the deterministic hashing stub (no model files required).
    pub testing_stub: bool,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            stub_dim: DEFAULT_STUB_DIM,
            testing_stub: false,
        }
    }
}

impl EmbedderConfig {
    pub const ENV_MODEL_PATH: &'static str = "ASKSPHERE_EMBEDDING_MODEL_PATH";
    pub const ENV_MAX_SEQ_LEN: &'static str = "ASKSPHERE_EMBEDDING_MAX_SEQ_LEN";
    pub const ENV_STUB: &'static str = "ASKSPHERE_EMBEDDING_STUB";

    /// Loads config from environment variables. No model path means stub mode.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let model_path = optional_path_from_env(Self::ENV_MODEL_PATH);
        let testing_stub = model_path.is_none() || flag_from_env(Self::ENV_STUB);

        Self {
            model_path,
            max_seq_len: parse_or_default(Self::ENV_MAX_SEQ_LEN, defaults.max_seq_len),
            testing_stub,
            ..defaults
        }
    }

    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: Some(model_path.into()),
            ..Default::default()
        }
    }

    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.max_seq_len == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "max_seq_len must be greater than zero".to_string(),
            });
        }

        if self.testing_stub {
            if self.stub_dim == 0 {
                return Err(EmbeddingError::InvalidConfig {
                    reason: "stub_dim must be greater than zero".to_string(),
                });
            }
            return Ok(());
        }

        match &self.model_path {
            None => Err(EmbeddingError::InvalidConfig {
                reason: "model_path is required (stubbing is disabled)".to_string(),
            }),
            Some(path) if !path.exists() => {
                Err(EmbeddingError::ModelNotFound { path: path.clone() })
            }
            Some(_) => Ok(()),
        }
    }
}
