//! HISCO occupational classifiers in pure Rust.
//!
//! A candle-based model-definition and inference layer for classifiers that
//! map short occupational description strings (historical census and
//! marriage-certificate free text) to standardized HISCO occupation codes.
//!
//! ## Architecture
//!
//! ```text
//! description → adapted tokenizer → pretrained encoder → pooled summary
//!                                                             ↓
//!                                            dropout + linear projection
//!                                                             ↓
//!                                             raw scores over HISCO classes
//! ```
//!
//! A second, self-contained head works directly on character sequences
//! (embedding → bidirectional LSTM → mean pooling → MLP → sigmoid) without
//! any pretrained encoder.
//!
//! ## Modules
//!
//! - [`vocab`] — extend a pretrained subword vocabulary with corpus tokens
//! - [`model`] — domain dispatch, encoder construction, classifier heads
//! - [`checkpoint`] — read-only fine-tuned checkpoint artifacts
//! - [`inference`] — batch prediction over a restored classifier
//!
//! Training loops, optimizers and checkpoint writing live outside this crate.

pub mod checkpoint;
pub mod config;
pub mod inference;
pub mod model;
pub mod vocab;

mod error;

pub use error::{Error, Result};
