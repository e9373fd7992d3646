//! Vocabulary adaptation.
//!
//! Pretrained subword vocabularies miss much of the historical occupational
//! lexicon ("skomagersvend", "boelsmand", ...). Before fine-tuning, the
//! tokenizer is extended with every whitespace-delimited token of the
//! training corpus, the corpus language tags, and a sentinel for unknown
//! languages. The adapted tokenizer is frozen afterwards; the encoder's
//! embedding table is resized to match (see [`crate::model::encoder`]).

use std::collections::BTreeSet;

use serde::Deserialize;
use tokenizers::{AddedToken, Tokenizer};

/// Sentinel token representing an unknown language.
pub const UNKNOWN_LANG_TOKEN: &str = "unk";

/// One training record as consumed by vocabulary adaptation.
///
/// Both fields are required; a record missing either is a deserialize error.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingRecord {
    /// Free-text occupational description.
    pub occ1: String,

    /// Language tag ("da", "en", "nl", ...).
    pub lang: String,
}

/// Extend `tokenizer` with the corpus vocabulary and freeze it.
///
/// Registers every whitespace-delimited token across all descriptions, every
/// distinct language tag, and [`UNKNOWN_LANG_TOKEN`]; tokens the tokenizer
/// already knows contribute nothing. Returns the adapted tokenizer and the
/// number of genuinely new tokens.
///
/// Takes the tokenizer by value: adaptation is a one-time build step and the
/// returned tokenizer is the frozen vocabulary snapshot shared by encoder
/// construction and inference. Idempotent — re-running on an already-adapted
/// tokenizer adds nothing. Empty input is a no-op.
pub fn adapt_tokenizer(
    mut tokenizer: Tokenizer,
    records: &[TrainingRecord],
) -> (Tokenizer, usize) {
    if records.is_empty() {
        return (tokenizer, 0);
    }

    // BTreeSet for a deterministic registration order.
    let mut tokens = BTreeSet::new();
    for record in records {
        for word in record.occ1.split_whitespace() {
            tokens.insert(word.to_string());
        }
        tokens.insert(record.lang.clone());
    }
    tokens.insert(UNKNOWN_LANG_TOKEN.to_string());

    let added: Vec<AddedToken> = tokens
        .into_iter()
        .map(|token| AddedToken::from(token, false))
        .collect();
    let new_tokens = tokenizer.add_tokens(&added);
    tracing::debug!(new_tokens, "adapted tokenizer vocabulary");

    (tokenizer, new_tokens)
}
