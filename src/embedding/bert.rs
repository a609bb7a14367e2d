//! BERT encoders on candle: a mean-pooled sentence encoder and a multi-label
//! sequence classifier.

use candle::{DType, Device, Module, Result, Tensor};
use candle_core as candle;
use candle_core::IndexOp;
use candle_nn::{Linear, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};
use std::path::Path;
use std::sync::Arc;

/// Reads the HF `config.json` of a BERT checkpoint.
pub fn read_config(model_dir: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(model_dir.join("config.json"))?;
    serde_json::from_str(&content)
        .map_err(|e| candle::Error::Msg(format!("Failed to parse config: {}", e)))
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let weights_path = model_dir.join("model.safetensors");
    // SAFETY: the weights file is opened read-only and is not modified while mapped.
    unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device) }
}

/// Finds the encoder under the checkpoint's prefix (`bert.`, `roberta.` or none).
fn load_encoder(vb: &VarBuilder, config: &Config) -> Result<BertModel> {
    if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
        BertModel::load(vb.pp("bert"), config)
    } else if vb.contains_tensor("roberta.embeddings.word_embeddings.weight") {
        BertModel::load(vb.pp("roberta"), config)
    } else {
        BertModel::load(vb.clone(), config)
    }
}

/// Sentence encoder producing one vector per input via attention-masked mean pooling.
#[derive(Clone)]
pub struct BertSentenceEncoder {
    bert: Arc<BertModel>,
    hidden_size: usize,
}

impl BertSentenceEncoder {
    pub fn load(model_dir: &Path, device: &Device) -> Result<Self> {
        let config = read_config(model_dir)?;
        let vb = load_weights(model_dir, device)?;
        let bert = load_encoder(&vb, &config)?;

        Ok(Self {
            bert: Arc::new(bert),
            hidden_size: config.hidden_size,
        })
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Returns the pooled `[batch, hidden]` embedding (not normalised).
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let hidden = self
            .bert
            .forward(input_ids, token_type_ids, Some(attention_mask))?;

        let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?.clamp(1e-9f32, f32::MAX)?;
        summed.broadcast_div(&counts)
    }
}

struct MultiLabelImpl {
    bert: BertModel,
    pooler: Option<Linear>,
    classifier: Linear,
}

impl MultiLabelImpl {
    fn load(vb: VarBuilder, config: &Config, num_labels: usize) -> Result<Self> {
        let bert = load_encoder(&vb, config)?;

        let hidden_size = config.hidden_size;
        let pooler = if vb.contains_tensor("bert.pooler.dense.weight") {
            Some(candle_nn::linear(
                hidden_size,
                hidden_size,
                vb.pp("bert.pooler.dense"),
            )?)
        } else {
            None
        };
        let classifier = candle_nn::linear(hidden_size, num_labels, vb.pp("classifier"))?;

        Ok(Self {
            bert,
            pooler,
            classifier,
        })
    }

    fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let output = self
            .bert
            .forward(input_ids, token_type_ids, Some(attention_mask))?;
        let cls_token = output.i((.., 0, ..))?;
        let pooled = match &self.pooler {
            Some(dense) => dense.forward(&cls_token)?.tanh()?,
            None => cls_token,
        };
        self.classifier.forward(&pooled)
    }
}

/// BERT classifier with one independent sigmoid output per label.
#[derive(Clone)]
pub struct BertMultiLabelClassifier(Arc<MultiLabelImpl>);

impl BertMultiLabelClassifier {
    pub fn load(model_dir: &Path, device: &Device, num_labels: usize) -> Result<Self> {
        let config = read_config(model_dir)?;
        let vb = load_weights(model_dir, device)?;
        let model = MultiLabelImpl::load(vb, &config, num_labels)?;
        Ok(Self(Arc::new(model)))
    }

    /// Returns per-label probabilities, shape `[batch, num_labels]`.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let logits = self.0.forward(input_ids, token_type_ids, attention_mask)?;
        candle_nn::ops::sigmoid(&logits)
    }
}
