//! Configuration for HISCO classifiers.
//!
//! Stored as `config.json` inside fine-tuned checkpoint directories; a
//! checkpoint must restore exactly the configuration it was trained with.

use serde::{Deserialize, Serialize};

use crate::model::char_lstm::CharVocab;
use crate::model::domain::ModelDomain;

fn default_max_len() -> usize {
    64
}

fn default_batch_size() -> usize {
    256
}

/// Configuration of a fine-tuned pooled-encoder classifier.
///
/// `domain`, `num_classes` and `dropout_rate` are required — a checkpoint
/// without them is unusable. `max_len` and `batch_size` are inference
/// knobs with defaults matching the trained models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinetuneConfig {
    /// Dataset/language domain selecting the pretrained encoder family.
    pub domain: ModelDomain,

    /// Cardinality of the HISCO label set the head projects to.
    pub num_classes: usize,

    /// Dropout probability applied between the pooled summary and the
    /// output projection (training mode only).
    pub dropout_rate: f32,

    /// Maximum token-sequence length; longer inputs are truncated.
    #[serde(default = "default_max_len")]
    pub max_len: usize,

    /// Inference batch size (throughput/memory trade-off, caller-tunable).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

/// Configuration of the character-level LSTM classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharLstmConfig {
    /// Size of the fixed character alphabet (including pad and unknown).
    pub alphabet_size: usize,

    /// Embedding width and per-direction LSTM hidden size.
    pub hidden_size: usize,

    /// Number of stacked bidirectional LSTM layers.
    pub num_layers: usize,

    /// Dropout probability on the character embeddings (training mode only).
    pub dropout_rate: f32,

    /// Cardinality of the HISCO label set.
    pub num_classes: usize,
}

impl Default for CharLstmConfig {
    fn default() -> Self {
        Self {
            alphabet_size: CharVocab::default().size(),
            hidden_size: 128,
            num_layers: 2,
            dropout_rate: 0.1,
            num_classes: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finetune_config_defaults() {
        let cfg: FinetuneConfig = serde_json::from_str(
            r#"{"domain": "Multilingual", "num_classes": 5, "dropout_rate": 0.2}"#,
        )
        .unwrap();
        assert_eq!(cfg.domain, ModelDomain::Multilingual);
        assert_eq!(cfg.num_classes, 5);
        assert_eq!(cfg.max_len, 64);
        assert_eq!(cfg.batch_size, 256);
    }

    #[test]
    fn finetune_config_requires_num_classes() {
        let parsed: Result<FinetuneConfig, _> =
            serde_json::from_str(r#"{"domain": "DK_CENSUS", "dropout_rate": 0.2}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn finetune_config_round_trip() {
        let cfg = FinetuneConfig {
            domain: ModelDomain::DkCensus,
            num_classes: 1919,
            dropout_rate: 0.2,
            max_len: 50,
            batch_size: 32,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: FinetuneConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.domain, ModelDomain::DkCensus);
        assert_eq!(back.num_classes, 1919);
        assert_eq!(back.max_len, 50);
    }

    #[test]
    fn char_lstm_config_default_alphabet() {
        let cfg = CharLstmConfig::default();
        assert_eq!(cfg.alphabet_size, CharVocab::default().size());
        assert_eq!(cfg.num_layers, 2);
    }
}
