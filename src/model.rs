//! Model components for HISCO classification.
//!
//! ## Components
//!
//! - [`domain`] — dataset/language domain → pretrained encoder dispatch
//! - [`encoder`] — tokenizer loading, encoder construction, embedding resize
//! - [`pooled`] — transformer classifier head over a pooled sentence summary
//! - [`char_lstm`] — character-level bidirectional LSTM classifier head

pub mod char_lstm;
pub mod domain;
pub mod encoder;
pub mod pooled;
