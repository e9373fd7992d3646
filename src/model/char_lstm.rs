//! Character-level bidirectional LSTM classifier head.
//!
//! Self-contained variant with no pretrained encoder: occupation strings are
//! mapped onto a fixed character alphabet and classified with
//! embedding → dropout → stacked bidirectional LSTM → mean pooling over time
//! → two leaky-ReLU layers → output projection → sigmoid.
//!
//! Two deliberate contracts, preserved from the trained models:
//! - pooling **averages** over the time dimension (length-invariant and
//!   robust to padding noise, unlike taking the final timestep);
//! - the output is passed through an element-wise **sigmoid** — independent
//!   per-class probabilities, not a softmax distribution. The transformer
//!   head in [`crate::model::pooled`] instead emits raw scores.

use std::collections::HashMap;

use candle_core::Tensor;
use candle_nn::rnn::{lstm, Direction, LSTMConfig, LSTM, RNN};
use candle_nn::{self as nn, VarBuilder};

use crate::config::CharLstmConfig;
use crate::Result;

/// Reserved padding index.
pub const PAD_IDX: u32 = 0;

/// Index for characters outside the alphabet.
pub const UNK_IDX: u32 = 1;

/// Characters covered beyond pad/unknown: Latin letters, digits, common
/// punctuation of occupation strings, and the Danish/Dutch/German letters
/// occurring in the source corpora.
const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz0123456789 '-.æøåäöüéèëï";

/// Fixed, finite character alphabet.
///
/// Index 0 is padding, index 1 is unknown; the alphabet characters follow in
/// a fixed order. The alphabet never changes after construction — character
/// indices are part of the checkpoint contract.
#[derive(Debug, Clone)]
pub struct CharVocab {
    index: HashMap<char, u32>,
}

impl Default for CharVocab {
    fn default() -> Self {
        let index = ALPHABET
            .chars()
            .enumerate()
            .map(|(i, c)| (c, i as u32 + 2))
            .collect();
        Self { index }
    }
}

impl CharVocab {
    /// Alphabet size including the pad and unknown indices.
    pub fn size(&self) -> usize {
        self.index.len() + 2
    }

    /// Encode a string to character indices, lowercased, truncated/padded to
    /// `max_len`. Padding uses [`PAD_IDX`]; no attention mask exists for
    /// this variant.
    pub fn encode(&self, text: &str, max_len: usize) -> Vec<u32> {
        let mut ids: Vec<u32> = text
            .to_lowercase()
            .chars()
            .take(max_len)
            .map(|c| self.index.get(&c).copied().unwrap_or(UNK_IDX))
            .collect();
        ids.resize(max_len, PAD_IDX);
        ids
    }
}

/// One bidirectional LSTM layer — a forward/backward pair with outputs
/// concatenated on the feature dimension.
///
/// Weight names follow PyTorch's `weight_ih_l{n}` / `weight_ih_l{n}_reverse`
/// convention, so trained checkpoints map one-to-one.
struct BiLstmLayer {
    fwd: LSTM,
    bwd: LSTM,
}

impl BiLstmLayer {
    fn new(in_dim: usize, hidden_dim: usize, layer_idx: usize, vb: VarBuilder) -> Result<Self> {
        let fwd = lstm(
            in_dim,
            hidden_dim,
            LSTMConfig {
                layer_idx,
                ..Default::default()
            },
            vb.clone(),
        )?;
        let bwd = lstm(
            in_dim,
            hidden_dim,
            LSTMConfig {
                layer_idx,
                direction: Direction::Backward,
                ..Default::default()
            },
            vb,
        )?;
        Ok(Self { fwd, bwd })
    }

    /// `[B, L, in_dim]` → `[B, L, 2 * hidden_dim]`.
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let out_f = self.fwd.states_to_tensor(&self.fwd.seq(xs)?)?;
        let reversed = reverse_time(xs)?;
        let out_b = self.bwd.states_to_tensor(&self.bwd.seq(&reversed)?)?;
        let out_b = reverse_time(&out_b)?;
        Ok(Tensor::cat(&[&out_f, &out_b], 2)?)
    }
}

/// Character-level recurrent occupation classifier.
pub struct CharLstmClassifier {
    embedding: nn::Embedding,
    dropout: nn::Dropout,
    layers: Vec<BiLstmLayer>,
    fc1: nn::Linear,
    fc2: nn::Linear,
    out: nn::Linear,
    activation: nn::Activation,
    num_classes: usize,
}

impl CharLstmClassifier {
    pub fn new(cfg: &CharLstmConfig, vb: VarBuilder) -> Result<Self> {
        let hidden = cfg.hidden_size;
        let embedding = nn::embedding(cfg.alphabet_size, hidden, vb.pp("embedding"))?;

        let mut layers = Vec::with_capacity(cfg.num_layers);
        for i in 0..cfg.num_layers {
            let in_dim = if i == 0 { hidden } else { 2 * hidden };
            layers.push(BiLstmLayer::new(in_dim, hidden, i, vb.pp("lstm"))?);
        }

        let fc1 = nn::linear(2 * hidden, 2 * hidden, vb.pp("fc1"))?;
        let fc2 = nn::linear(2 * hidden, hidden, vb.pp("fc2"))?;
        let out = nn::linear(hidden, cfg.num_classes, vb.pp("output_layer"))?;

        Ok(Self {
            embedding,
            dropout: nn::Dropout::new(cfg.dropout_rate),
            layers,
            fc1,
            fc2,
            out,
            activation: nn::Activation::LeakyRelu(0.01),
            num_classes: cfg.num_classes,
        })
    }

    /// Forward pass.
    ///
    /// `input_ids` is `[B, L]` of character indices from [`CharVocab`],
    /// padded with [`PAD_IDX`] to a common length; the LSTM processes the
    /// full padded length. Returns per-class probabilities
    /// `[B, num_classes]`, every value in [0, 1].
    pub fn forward(&self, input_ids: &Tensor, train: bool) -> Result<Tensor> {
        let embedded = input_ids.apply(&self.embedding)?;
        let mut hidden = self.dropout.forward(&embedded, train)?;
        for layer in &self.layers {
            hidden = layer.forward(&hidden)?;
        }
        let pooled = mean_pool(&hidden)?;
        let h = pooled.apply(&self.fc1)?.apply(&self.activation)?;
        let h = h.apply(&self.fc2)?.apply(&self.activation)?;
        let logits = h.apply(&self.out)?;
        Ok(nn::ops::sigmoid(&logits)?)
    }

    /// Number of output classes.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

/// Average over the time dimension: `[B, L, D]` → `[B, D]`.
///
/// Averaging (not summing) keeps the aggregate magnitude independent of
/// sequence length.
fn mean_pool(xs: &Tensor) -> candle_core::Result<Tensor> {
    xs.mean(1)
}

/// Reverse a `[B, L, D]` tensor along the time dimension.
fn reverse_time(xs: &Tensor) -> candle_core::Result<Tensor> {
    let len = xs.dim(1)?;
    let idx: Vec<u32> = (0..len as u32).rev().collect();
    let idx = Tensor::from_vec(idx, len, xs.device())?;
    xs.index_select(&idx, 1)
}
