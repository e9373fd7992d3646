//! Transformer classifier head over a pooled sentence summary.
//!
//! One generic head covers both encoder families (BERT and XLM-RoBERTa) —
//! the two differ only in the wrapped [`Encoder`]. The head owns the
//! BERT-style pooler (linear + tanh over the position-0 hidden state),
//! dropout, and the output projection to the HISCO class space.
//!
//! Emits raw unnormalized scores; softmax normalization is the caller's
//! responsibility (see [`crate::inference`]). This is deliberately asymmetric
//! with [`crate::model::char_lstm`], which applies a sigmoid itself.

use candle_core::Tensor;
use candle_nn::{self as nn, VarBuilder};

use crate::model::encoder::Encoder;
use crate::{Error, Result};

/// Pooled-encoder occupation classifier.
pub struct PooledOccupationClassifier {
    encoder: Encoder,
    pooler: nn::Linear,
    dropout: nn::Dropout,
    out: nn::Linear,
    num_classes: usize,
}

impl PooledOccupationClassifier {
    /// Wrap `encoder` with a classification head for `num_classes` classes.
    ///
    /// Head weights live under `pooler` and `out` in the VarBuilder; the
    /// pooler is part of the trained parameters and is restored from the
    /// checkpoint like everything else.
    pub fn new(
        encoder: Encoder,
        num_classes: usize,
        dropout_rate: f32,
        vb: VarBuilder,
    ) -> Result<Self> {
        let hidden_size = encoder.hidden_size();
        let pooler = nn::linear(hidden_size, hidden_size, vb.pp("pooler"))?;
        let out = nn::linear(hidden_size, num_classes, vb.pp("out"))?;
        Ok(Self {
            encoder,
            pooler,
            dropout: nn::Dropout::new(dropout_rate),
            out,
            num_classes,
        })
    }

    /// Forward pass.
    ///
    /// - `input_ids`: `[B, L]` token ids from the frozen adapted tokenizer
    /// - `attention_mask`: `[B, L]`, 1 for real tokens, 0 for padding
    /// - `train`: dropout is active only when true; at inference it is the
    ///   identity and the output is deterministic
    ///
    /// Returns raw class scores `[B, num_classes]` — no softmax applied.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        attention_mask: &Tensor,
        train: bool,
    ) -> Result<Tensor> {
        self.check_ids_in_range(input_ids)?;
        let hidden = self.encoder.encode(input_ids, attention_mask)?;
        // Position 0 is the designated sentence summary token.
        let summary = hidden.narrow(1, 0, 1)?.squeeze(1)?;
        let pooled = summary.apply(&self.pooler)?.tanh()?;
        let dropped = self.dropout.forward(&pooled, train)?;
        Ok(dropped.apply(&self.out)?)
    }

    /// Number of output classes.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// The wrapped encoder.
    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// Token ids beyond the embedding table mean the tokenizer is not the
    /// one this model was built with. Never truncate or wrap — fail.
    fn check_ids_in_range(&self, input_ids: &Tensor) -> Result<()> {
        let rows = self.encoder.embedding_rows();
        let max_id = input_ids.flatten_all()?.max(0)?.to_scalar::<u32>()? as usize;
        if max_id >= rows {
            return Err(Error::VocabularyMismatch(format!(
                "token id {max_id} exceeds embedding table of {rows} rows"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::domain::ModelDomain;
    use crate::model::encoder::tests::tiny_bert_config;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    const VOCAB: usize = 48;
    const HIDDEN: usize = 16;
    const CLASSES: usize = 5;

    fn classifier(dropout_rate: f32) -> PooledOccupationClassifier {
        let dev = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &dev);
        let encoder = Encoder::from_config_value(
            ModelDomain::EnMarrCert,
            tiny_bert_config(VOCAB, HIDDEN),
            VOCAB,
            vb.pp("basemodel"),
        )
        .unwrap();
        PooledOccupationClassifier::new(encoder, CLASSES, dropout_rate, vb).unwrap()
    }

    fn batch(dev: &Device) -> (Tensor, Tensor) {
        let ids = Tensor::from_vec(
            vec![1u32, 7, 12, 45, 3, 0, 0, 2, 9, 30, 31, 32, 33, 34],
            (2, 7),
            dev,
        )
        .unwrap();
        let mask = Tensor::from_vec(
            vec![1u32, 1, 1, 1, 1, 0, 0, 1, 1, 1, 1, 1, 1, 1],
            (2, 7),
            dev,
        )
        .unwrap();
        (ids, mask)
    }

    #[test]
    fn forward_shape_is_batch_by_classes() {
        let dev = Device::Cpu;
        let model = classifier(0.1);
        let (ids, mask) = batch(&dev);
        let scores = model.forward(&ids, &mask, false).unwrap();
        assert_eq!(scores.dims(), &[2, CLASSES]);
    }

    #[test]
    fn scores_are_unnormalized() {
        let dev = Device::Cpu;
        let model = classifier(0.0);
        let (ids, mask) = batch(&dev);
        let scores = model.forward(&ids, &mask, false).unwrap();
        let rows = scores.to_vec2::<f32>().unwrap();
        // Raw logits: rows are not probability distributions.
        for row in rows {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() > 1e-4);
        }
    }

    #[test]
    fn out_of_range_token_id_is_a_vocabulary_mismatch() {
        let dev = Device::Cpu;
        let model = classifier(0.1);
        let ids = Tensor::from_vec(vec![1u32, VOCAB as u32], (1, 2), &dev).unwrap();
        let mask = Tensor::ones((1, 2), DType::U32, &dev).unwrap();
        let err = model.forward(&ids, &mask, false).unwrap_err();
        assert!(matches!(err, Error::VocabularyMismatch(_)));
    }

    #[test]
    fn inference_mode_is_deterministic() {
        let dev = Device::Cpu;
        let model = classifier(0.5);
        let (ids, mask) = batch(&dev);
        let first = model
            .forward(&ids, &mask, false)
            .unwrap()
            .to_vec2::<f32>()
            .unwrap();
        let second = model
            .forward(&ids, &mask, false)
            .unwrap()
            .to_vec2::<f32>()
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn training_mode_applies_dropout_without_failing() {
        let dev = Device::Cpu;
        let model = classifier(0.5);
        let (ids, mask) = batch(&dev);
        // Stochastic; only the contract (shape, no error) is guaranteed.
        let scores = model.forward(&ids, &mask, true).unwrap();
        assert_eq!(scores.dims(), &[2, CLASSES]);
    }

    #[test]
    #[ignore = "downloads pretrained weights from the HuggingFace Hub"]
    fn multilingual_end_to_end() {
        use crate::model::encoder::{build_encoder, load_tokenizer};
        use crate::vocab::{adapt_tokenizer, TrainingRecord};

        let dev = Device::Cpu;
        let domain = ModelDomain::Multilingual;
        let tokenizer = load_tokenizer(domain).unwrap();
        let (tokenizer, _) = adapt_tokenizer(
            tokenizer,
            &[TrainingRecord {
                occ1: "tailor of fine dresses".to_string(),
                lang: "en".to_string(),
            }],
        );
        let encoder = build_encoder(domain, &tokenizer, &dev).unwrap();
        assert_eq!(encoder.embedding_rows(), tokenizer.get_vocab_size(true));

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &dev);
        let model = PooledOccupationClassifier::new(encoder, 5, 0.1, vb).unwrap();

        let encoding = tokenizer.encode("tailor of fine dresses", true).unwrap();
        let len = encoding.get_ids().len();
        let ids = Tensor::from_vec(encoding.get_ids().to_vec(), (1, len), &dev).unwrap();
        let mask =
            Tensor::from_vec(encoding.get_attention_mask().to_vec(), (1, len), &dev).unwrap();
        let scores = model.forward(&ids, &mask, false).unwrap();
        assert_eq!(scores.dims(), &[1, 5]);
    }
}
