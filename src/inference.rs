//! Batch prediction over a restored classifier.
//!
//! The [`Predictor`] owns the frozen adapted tokenizer and a
//! [`PooledOccupationClassifier`] restored from a checkpoint. Texts are
//! tokenized, padded per batch, run through the head in inference mode, and
//! the raw scores are softmax-normalized here — the head itself emits
//! unnormalized scores by contract.
//!
//! Batches are processed sequentially on whatever device the model was
//! loaded on. No queueing, retries or timeouts at this layer.

use candle_core::{Device, Tensor, D};
use tokenizers::Tokenizer;

use crate::checkpoint::Checkpoint;
use crate::model::encoder::Encoder;
use crate::model::pooled::PooledOccupationClassifier;
use crate::Result;

/// Batch predictor for occupational descriptions.
pub struct Predictor {
    tokenizer: Tokenizer,
    classifier: PooledOccupationClassifier,
    device: Device,
    batch_size: usize,
    max_len: usize,
    pad_id: u32,
}

impl Predictor {
    /// Restore a predictor from a fine-tuned checkpoint directory.
    ///
    /// `batch_size` overrides the checkpoint's stored value when given.
    pub fn from_checkpoint(
        dir: impl AsRef<std::path::Path>,
        device: &Device,
        batch_size: Option<usize>,
    ) -> Result<Self> {
        let checkpoint = Checkpoint::open(dir)?;
        let config = checkpoint.config()?;
        let tokenizer = checkpoint.tokenizer()?;
        tracing::info!(
            domain = %config.domain,
            num_classes = config.num_classes,
            "restoring fine-tuned classifier"
        );

        let vb = checkpoint.var_builder(device)?;
        let encoder = Encoder::from_config_value(
            config.domain,
            checkpoint.encoder_config()?,
            tokenizer.get_vocab_size(true),
            vb.pp("basemodel"),
        )?;
        let classifier = PooledOccupationClassifier::new(
            encoder,
            config.num_classes,
            config.dropout_rate,
            vb,
        )?;

        Ok(Self::new(
            tokenizer,
            classifier,
            device.clone(),
            batch_size.unwrap_or(config.batch_size),
            config.max_len,
        ))
    }

    /// Build a predictor from already-constructed parts.
    pub fn new(
        tokenizer: Tokenizer,
        classifier: PooledOccupationClassifier,
        device: Device,
        batch_size: usize,
        max_len: usize,
    ) -> Self {
        let pad_id = tokenizer
            .token_to_id("[PAD]")
            .or_else(|| tokenizer.token_to_id("<pad>"))
            .unwrap_or(0);
        Self {
            tokenizer,
            classifier,
            device,
            batch_size: batch_size.max(1),
            max_len: max_len.max(1),
            pad_id,
        }
    }

    /// Class probabilities for each text, rows summing to 1.
    pub fn predict_probs(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut probs = Vec::with_capacity(texts.len());
        for (batch_idx, chunk) in texts.chunks(self.batch_size).enumerate() {
            tracing::debug!(batch = batch_idx, size = chunk.len(), "running batch");
            let (input_ids, attention_mask) = self.encode_batch(chunk)?;
            let scores = self
                .classifier
                .forward(&input_ids, &attention_mask, false)?;
            let normalized = candle_nn::ops::softmax(&scores, D::Minus1)?;
            probs.extend(normalized.to_vec2::<f32>()?);
        }
        Ok(probs)
    }

    /// Most probable class index for each text.
    pub fn predict(&self, texts: &[&str]) -> Result<Vec<usize>> {
        let probs = self.predict_probs(texts)?;
        Ok(probs.iter().map(|row| argmax(row)).collect())
    }

    /// The frozen tokenizer.
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Tokenize and pad one batch to a common length.
    ///
    /// Over-length sequences are truncated to `max_len` while keeping the
    /// trailing special token ([SEP] / `</s>`) when the tokenizer appends
    /// one, so truncated inputs keep the encoder family's sentence framing.
    fn encode_batch(&self, texts: &[&str]) -> Result<(Tensor, Tensor)> {
        let mut sequences = Vec::with_capacity(texts.len());
        for text in texts {
            let encoding = self.tokenizer.encode(*text, true)?;
            let all_ids = encoding.get_ids();
            let ids: Vec<u32> = if all_ids.len() > self.max_len {
                let mut truncated = all_ids[..self.max_len].to_vec();
                let ends_with_special =
                    encoding.get_special_tokens_mask().last().copied() == Some(1);
                if ends_with_special {
                    if let Some(&last) = all_ids.last() {
                        truncated[self.max_len - 1] = last;
                    }
                }
                truncated
            } else {
                all_ids.to_vec()
            };
            sequences.push(ids);
        }
        let width = sequences.iter().map(Vec::len).max().unwrap_or(0).max(1);

        let mut ids = Vec::with_capacity(texts.len() * width);
        let mut mask = Vec::with_capacity(texts.len() * width);
        for sequence in &sequences {
            for pos in 0..width {
                match sequence.get(pos) {
                    Some(&id) => {
                        ids.push(id);
                        mask.push(1u32);
                    }
                    None => {
                        ids.push(self.pad_id);
                        mask.push(0u32);
                    }
                }
            }
        }

        let shape = (texts.len(), width);
        let input_ids = Tensor::from_vec(ids, shape, &self.device)?;
        let attention_mask = Tensor::from_vec(mask, shape, &self.device)?;
        Ok((input_ids, attention_mask))
    }
}

fn argmax(row: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in row.iter().enumerate() {
        if *v > row[best] {
            best = i;
        }
    }
    best
}
