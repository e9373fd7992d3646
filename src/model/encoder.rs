//! Tokenizer loading and pretrained encoder construction.
//!
//! The encoder for a [`ModelDomain`] is fetched from the HuggingFace Hub
//! (config + safetensors), its word-embedding table is resized to the adapted
//! tokenizer's vocabulary, and the result is wrapped behind [`Encoder`] so
//! the classifier heads never care which encoder family they sit on.
//!
//! Invariant enforced here: after construction,
//! `encoder.embedding_rows() == tokenizer.get_vocab_size(true)`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use candle_transformers::models::xlm_roberta::{Config as XlmRobertaConfig, XLMRobertaModel};
use hf_hub::api::sync::Api;
use tokenizers::Tokenizer;

use crate::model::domain::ModelDomain;
use crate::{Error, Result};

/// Load the pretrained tokenizer for a domain from the HuggingFace Hub.
///
/// The multilingual domain resolves to the SentencePiece-based XLM-RoBERTa
/// tokenizer, the others to BERT WordPiece tokenizers; both ship as
/// `tokenizer.json` and load through the same code path.
///
/// Only hub repos that publish `tokenizer.json` are supported. Legacy
/// `vocab.txt`-only repos (notably `Maltehb/danish-bert-botxo` for
/// [`ModelDomain::DkCensus`]) fail here with [`crate::Error::HfHub`];
/// converting such vocabularies is left to the orchestration layer.
pub fn load_tokenizer(domain: ModelDomain) -> Result<Tokenizer> {
    let reference = domain.pretrained_ref();
    tracing::info!(model = reference, "fetching pretrained tokenizer");
    let path = hub_file(reference, "tokenizer.json")?;
    Ok(Tokenizer::from_file(path)?)
}

/// Build the pretrained encoder for a domain, resized to `tokenizer`.
///
/// Fetches `config.json` and `model.safetensors` from the Hub, appends
/// zero-initialized word-embedding rows for every token the vocabulary
/// adapter added, and constructs the model. The tokenizer must be the frozen
/// post-adaptation snapshot.
pub fn build_encoder(
    domain: ModelDomain,
    tokenizer: &Tokenizer,
    device: &Device,
) -> Result<Encoder> {
    let reference = domain.pretrained_ref();
    tracing::info!(model = reference, "fetching pretrained encoder weights");
    let config_path = hub_file(reference, "config.json")?;
    let weights_path = hub_file(reference, "model.safetensors")?;
    build_encoder_from_files(domain, &config_path, &weights_path, tokenizer, device)
}

/// [`build_encoder`] over already-downloaded files (local cache, tests).
pub fn build_encoder_from_files(
    domain: ModelDomain,
    config_path: &Path,
    weights_path: &Path,
    tokenizer: &Tokenizer,
    device: &Device,
) -> Result<Encoder> {
    let vocab_size = tokenizer.get_vocab_size(true);
    let config: serde_json::Value = serde_json::from_str(&fs::read_to_string(config_path)?)?;

    let tensors = candle_core::safetensors::load(weights_path, device)?;
    // Base-model checkpoints prefix weights with the architecture name.
    let prefix = if domain.uses_sentencepiece() {
        "roberta."
    } else {
        "bert."
    };
    let mut tensors = strip_model_prefix(tensors, prefix);
    resize_word_embeddings(&mut tensors, vocab_size)?;

    let vb = VarBuilder::from_tensors(tensors, DType::F32, device);
    Encoder::from_config_value(domain, config, vocab_size, vb)
}

/// A pretrained sequence encoder producing per-token hidden states.
pub enum Encoder {
    Bert {
        model: BertModel,
        hidden_size: usize,
        embedding_rows: usize,
    },
    XlmRoberta {
        model: XLMRobertaModel,
        hidden_size: usize,
        embedding_rows: usize,
    },
}

impl Encoder {
    /// Construct from a raw `config.json` value and a weight source.
    ///
    /// The config's `vocab_size` is overridden with `vocab_size` before the
    /// model is built, so the embedding table always matches the supplied
    /// tokenizer state.
    pub fn from_config_value(
        domain: ModelDomain,
        mut config: serde_json::Value,
        vocab_size: usize,
        vb: VarBuilder,
    ) -> Result<Self> {
        let hidden_size = config
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| Error::Config("encoder config lacks hidden_size".to_string()))?
            as usize;
        config["vocab_size"] = serde_json::Value::from(vocab_size as u64);

        match domain {
            ModelDomain::Multilingual => {
                let config: XlmRobertaConfig = serde_json::from_value(config)?;
                let model = XLMRobertaModel::new(&config, vb)?;
                Ok(Encoder::XlmRoberta {
                    model,
                    hidden_size,
                    embedding_rows: vocab_size,
                })
            }
            _ => {
                let config: BertConfig = serde_json::from_value(config)?;
                let model = BertModel::load(vb, &config)?;
                Ok(Encoder::Bert {
                    model,
                    hidden_size,
                    embedding_rows: vocab_size,
                })
            }
        }
    }

    /// Encode a batch of token ids into per-token hidden states `[B, L, H]`.
    ///
    /// `attention_mask` is `[B, L]`, 1 for real tokens and 0 for padding.
    /// Position 0 holds the encoder family's designated sentence summary
    /// token (`[CLS]` / `<s>`).
    pub fn encode(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = match self {
            Encoder::Bert { model, .. } => {
                model.forward(input_ids, &token_type_ids, Some(attention_mask))?
            }
            Encoder::XlmRoberta { model, .. } => {
                model.forward(input_ids, attention_mask, &token_type_ids, None, None, None)?
            }
        };
        Ok(hidden)
    }

    /// Width of the hidden states.
    pub fn hidden_size(&self) -> usize {
        match self {
            Encoder::Bert { hidden_size, .. } | Encoder::XlmRoberta { hidden_size, .. } => {
                *hidden_size
            }
        }
    }

    /// Row count of the input-embedding table.
    ///
    /// Always equals the adapted tokenizer's vocabulary size.
    pub fn embedding_rows(&self) -> usize {
        match self {
            Encoder::Bert { embedding_rows, .. }
            | Encoder::XlmRoberta { embedding_rows, .. } => *embedding_rows,
        }
    }
}

/// Grow every word-embedding tensor in `tensors` to `target_rows` rows.
///
/// New rows are zero-initialized; fine-tuning gives them values. A source
/// embedding with *more* rows than the target means the tokenizer is not the
/// one the weights were saved with — vocabulary growth is monotonic, so a
/// shrink can only be desynchronization.
pub fn resize_word_embeddings(
    tensors: &mut HashMap<String, Tensor>,
    target_rows: usize,
) -> Result<()> {
    let keys: Vec<String> = tensors
        .keys()
        .filter(|k| k.ends_with("word_embeddings.weight"))
        .cloned()
        .collect();
    if keys.is_empty() {
        return Err(Error::Config(
            "no word-embedding tensor found in encoder weights".to_string(),
        ));
    }

    for key in keys {
        let embedding = &tensors[&key];
        let (rows, width) = embedding.dims2()?;
        if rows > target_rows {
            return Err(Error::VocabularyMismatch(format!(
                "pretrained embedding has {rows} rows but the tokenizer only knows {target_rows} tokens"
            )));
        }
        if rows < target_rows {
            tracing::debug!(
                tensor = key.as_str(),
                rows,
                target_rows,
                "resizing word embeddings for added tokens"
            );
            let new_rows = Tensor::zeros(
                (target_rows - rows, width),
                embedding.dtype(),
                embedding.device(),
            )?;
            let resized = Tensor::cat(&[embedding, &new_rows], 0)?;
            tensors.insert(key, resized);
        }
    }
    Ok(())
}

/// Strip an architecture prefix ("bert.", "roberta.") from checkpoint keys.
///
/// Keys outside the prefix (MLM heads etc.) are dropped. Checkpoints without
/// the prefix pass through unchanged.
fn strip_model_prefix(
    tensors: HashMap<String, Tensor>,
    prefix: &str,
) -> HashMap<String, Tensor> {
    if !tensors.keys().any(|k| k.starts_with(prefix)) {
        return tensors;
    }
    tensors
        .into_iter()
        .filter_map(|(key, tensor)| {
            key.strip_prefix(prefix)
                .map(|stripped| (stripped.to_string(), tensor))
        })
        .collect()
}

fn hub_file(reference: &str, filename: &str) -> Result<std::path::PathBuf> {
    let api = Api::new().map_err(|e| Error::HfHub(e.to_string()))?;
    api.model(reference.to_string())
        .get(filename)
        .map_err(|e| Error::HfHub(e.to_string()))
}
