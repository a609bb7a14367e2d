//! Sentence embedder (all-MiniLM-L6-v2 layout) loaded lazily on first use.

use std::path::{Path, PathBuf};

use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::Embedder;
use super::bert::BertSentenceEncoder;
use super::config::EmbedderConfig;
use super::device::select_device;
use super::error::EmbeddingError;
use super::lazy::LazyModel;
use super::similarity::normalize;
use super::utils::{check_model_dir, load_tokenizer_with_truncation};

struct LoadedEncoder {
    encoder: BertSentenceEncoder,
    tokenizer: Tokenizer,
    device: Device,
}

impl LoadedEncoder {
    fn load(model_dir: &Path, max_seq_len: usize) -> Result<Self, EmbeddingError> {
        check_model_dir(model_dir).map_err(|reason| EmbeddingError::ModelLoadFailed { reason })?;

        let device = select_device();
        let encoder = BertSentenceEncoder::load(model_dir, &device).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to load BERT encoder: {}", e),
            }
        })?;
        let tokenizer = load_tokenizer_with_truncation(model_dir, max_seq_len).map_err(|e| {
            EmbeddingError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            }
        })?;

        info!(
            model_path = %model_dir.display(),
            hidden_size = encoder.hidden_size(),
            max_seq_len,
            ?device,
            "Sentence embedder loaded"
        );

        Ok(Self {
            encoder,
            tokenizer,
            device,
        })
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            self.tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        if encoding.get_ids().is_empty() {
            return Ok(vec![0.0; self.encoder.hidden_size()]);
        }

        debug!(
            text_len = text.len(),
            token_count = encoding.get_ids().len(),
            "Generating sentence embedding"
        );

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask =
            Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let pooled = self
            .encoder
            .forward(&input_ids, &type_ids, &attention_mask)?
            .squeeze(0)?
            .to_vec1::<f32>()?;

        Ok(normalize(pooled))
    }
}

/// BERT sentence embedder. The model is read from disk on the first
/// [`embed`](Embedder::embed) call (or an explicit [`ensure_loaded`](Self::ensure_loaded)).
pub struct SentenceEmbedder {
    model_dir: PathBuf,
    config: EmbedderConfig,
    model: LazyModel<LoadedEncoder>,
}

impl std::fmt::Debug for SentenceEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceEmbedder")
            .field("model_dir", &self.model_dir)
            .field("loaded", &self.model.is_loaded())
            .field("max_seq_len", &self.config.max_seq_len)
            .finish()
    }
}

impl SentenceEmbedder {
    /// Validates the config; does not touch the model files yet.
    pub fn new(config: EmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;
        let model_dir = config
            .model_path
            .clone()
            .ok_or_else(|| EmbeddingError::InvalidConfig {
                reason: "model_path is required".to_string(),
            })?;

        Ok(Self {
            model_dir,
            config,
            model: LazyModel::new(),
        })
    }

    /// Loads the model now instead of on first use.
    pub fn ensure_loaded(&self) -> Result<(), EmbeddingError> {
        self.loaded().map(|_| ())
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_loaded()
    }

    fn loaded(&self) -> Result<&LoadedEncoder, EmbeddingError> {
        self.model
            .get_or_try_load(|| LoadedEncoder::load(&self.model_dir, self.config.max_seq_len))
    }
}

impl Embedder for SentenceEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.loaded()?.embed(text)
    }

    fn dimension(&self) -> usize {
        self.model
            .get()
            .map(|m| m.encoder.hidden_size())
            .unwrap_or(self.config.embedding_dim)
    }
}
