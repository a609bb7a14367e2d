//! Detoxify-style multi-label toxicity classifier on candle.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::ToxicityClassifier;
use super::error::ClassifierError;
use crate::embedding::bert::BertMultiLabelClassifier;
use crate::embedding::device::select_device;
use crate::embedding::lazy::LazyModel;
use crate::embedding::utils::{check_model_dir, load_tokenizer_with_truncation};

/// Labels of the Detoxify "original" checkpoint, in output order.
pub const DEFAULT_LABELS: [&str; 6] = [
    "toxicity",
    "severe_toxicity",
    "obscene",
    "threat",
    "insult",
    "identity_attack",
];

/// Maps Jigsaw-style label names to the names the rest of the pipeline uses.
fn canonical_label(label: &str) -> String {
    match label.to_lowercase().as_str() {
        "toxic" => "toxicity".to_string(),
        "severe_toxic" => "severe_toxicity".to_string(),
        "identity_hate" => "identity_attack".to_string(),
        other => other.to_string(),
    }
}

/// Reads labels from `config.json`'s `id2label`, ordered by id.
pub fn read_labels(model_dir: &Path) -> Result<Vec<String>, ClassifierError> {
    let raw = std::fs::read_to_string(model_dir.join("config.json")).map_err(|e| {
        ClassifierError::ModelLoadFailed {
            reason: format!("Failed to read config.json: {}", e),
        }
    })?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| ClassifierError::ModelLoadFailed {
            reason: format!("Failed to parse config.json: {}", e),
        })?;

    let Some(id2label) = value.get("id2label").and_then(|v| v.as_object()) else {
        return Ok(DEFAULT_LABELS.iter().map(|l| l.to_string()).collect());
    };

    let mut labels = Vec::with_capacity(id2label.len());
    for (id, label) in id2label {
        let id: usize = id.parse().map_err(|_| ClassifierError::ModelLoadFailed {
            reason: format!("id2label has a non-numeric id: {}", id),
        })?;
        let label = label
            .as_str()
            .ok_or_else(|| ClassifierError::ModelLoadFailed {
                reason: format!("id2label[{}] is not a string", id),
            })?;
        labels.push((id, canonical_label(label)));
    }
    labels.sort_by_key(|(id, _)| *id);

    Ok(labels.into_iter().map(|(_, label)| label).collect())
}

struct LoadedClassifier {
    model: BertMultiLabelClassifier,
    tokenizer: Tokenizer,
    labels: Vec<String>,
    device: Device,
}

impl LoadedClassifier {
    fn load(model_dir: &Path, max_seq_len: usize) -> Result<Self, ClassifierError> {
        check_model_dir(model_dir).map_err(|reason| ClassifierError::ModelLoadFailed { reason })?;

        let labels = read_labels(model_dir)?;
        let device = select_device();
        let model = BertMultiLabelClassifier::load(model_dir, &device, labels.len()).map_err(
            |e| ClassifierError::ModelLoadFailed {
                reason: format!("Failed to load classifier: {}", e),
            },
        )?;
        let tokenizer = load_tokenizer_with_truncation(model_dir, max_seq_len).map_err(|e| {
            ClassifierError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            }
        })?;

        info!(
            model_path = %model_dir.display(),
            labels = ?labels,
            ?device,
            "Toxicity classifier loaded"
        );

        Ok(Self {
            model,
            tokenizer,
            labels,
            device,
        })
    }

    fn predict(&self, text: &str) -> Result<BTreeMap<String, f32>, ClassifierError> {
        let encoding =
            self.tokenizer
                .encode(text, true)
                .map_err(|e| ClassifierError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask =
            Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let probs = self
            .model
            .forward(&input_ids, &type_ids, &attention_mask)?
            .squeeze(0)?
            .to_vec1::<f32>()?;

        debug!(
            token_count = encoding.get_ids().len(),
            "Toxicity classification complete"
        );

        Ok(self.labels.iter().cloned().zip(probs).collect())
    }
}

/// Multi-label BERT toxicity classifier, loaded on first use.
pub struct DetoxifyClassifier {
    model_dir: PathBuf,
    max_seq_len: usize,
    model: LazyModel<LoadedClassifier>,
}

impl std::fmt::Debug for DetoxifyClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetoxifyClassifier")
            .field("model_dir", &self.model_dir)
            .field("loaded", &self.model.is_loaded())
            .finish()
    }
}

impl DetoxifyClassifier {
    pub fn new(model_dir: impl Into<PathBuf>, max_seq_len: usize) -> Result<Self, ClassifierError> {
        let model_dir = model_dir.into();
        if !model_dir.exists() {
            return Err(ClassifierError::ModelNotFound { path: model_dir });
        }
        Ok(Self {
            model_dir,
            max_seq_len,
            model: LazyModel::new(),
        })
    }

    pub fn ensure_loaded(&self) -> Result<(), ClassifierError> {
        self.loaded().map(|_| ())
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_loaded()
    }

    fn loaded(&self) -> Result<&LoadedClassifier, ClassifierError> {
        self.model
            .get_or_try_load(|| LoadedClassifier::load(&self.model_dir, self.max_seq_len))
    }
}

impl ToxicityClassifier for DetoxifyClassifier {
    fn predict(&self, text: &str) -> Result<BTreeMap<String, f32>, ClassifierError> {
        self.loaded()?.predict(text)
    }
}
