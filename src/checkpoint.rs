//! Fine-tuned checkpoint artifacts.
//!
//! A checkpoint is a directory produced by the (external) training layer:
//!
//! ```text
//! <dir>/
//!   config.json          FinetuneConfig — domain, num_classes, dropout, ...
//!   encoder_config.json  raw pretrained-encoder config (hidden size, layers)
//!   tokenizer.json       the frozen adapted tokenizer state
//!   model.safetensors    classifier parameters (encoder under `basemodel`,
//!                        head under `pooler` / `out`)
//! ```
//!
//! The tokenizer state must match the training-time state bit-for-bit —
//! size and token-to-index mapping — or embedding lookups are undefined; the
//! embedding-row invariant check at construction surfaces any drift. This
//! crate only consumes checkpoints; writing them is the training layer's job.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use tokenizers::Tokenizer;

use crate::config::FinetuneConfig;
use crate::{Error, Result};

const CONFIG_FILE: &str = "config.json";
const ENCODER_CONFIG_FILE: &str = "encoder_config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";

/// A read-only fine-tuned checkpoint directory.
#[derive(Debug)]
pub struct Checkpoint {
    dir: PathBuf,
}

impl Checkpoint {
    /// Open a checkpoint directory, validating that all artifacts exist.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        for file in [CONFIG_FILE, ENCODER_CONFIG_FILE, TOKENIZER_FILE, WEIGHTS_FILE] {
            if !dir.join(file).is_file() {
                return Err(Error::Checkpoint(format!(
                    "missing {file} in {}",
                    dir.display()
                )));
            }
        }
        Ok(Self { dir })
    }

    /// The fine-tuning configuration the checkpoint was trained with.
    pub fn config(&self) -> Result<FinetuneConfig> {
        let raw = fs::read_to_string(self.dir.join(CONFIG_FILE))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// The raw pretrained-encoder `config.json` value.
    pub fn encoder_config(&self) -> Result<serde_json::Value> {
        let raw = fs::read_to_string(self.dir.join(ENCODER_CONFIG_FILE))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// The frozen adapted tokenizer used during training.
    pub fn tokenizer(&self) -> Result<Tokenizer> {
        Ok(Tokenizer::from_file(self.dir.join(TOKENIZER_FILE))?)
    }

    /// Load all parameters onto `device`.
    pub fn tensors(&self, device: &Device) -> Result<HashMap<String, Tensor>> {
        Ok(candle_core::safetensors::load(
            self.dir.join(WEIGHTS_FILE),
            device,
        )?)
    }

    /// Load all parameters into a [`VarBuilder`] for model construction.
    pub fn var_builder(&self, device: &Device) -> Result<VarBuilder<'static>> {
        let tensors = self.tensors(device)?;
        Ok(VarBuilder::from_tensors(tensors, DType::F32, device))
    }

    /// Directory this checkpoint lives in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
