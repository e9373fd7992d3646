//! Dataset/language domain → pretrained encoder dispatch.
//!
//! Each training corpus is tied to one pretrained encoder: a language-specific
//! BERT for the Danish census, English marriage-certificate and Dutch HSN
//! corpora, and XLM-RoBERTa for the multilingual setup. The mapping is a
//! closed table; an unrecognized tag is a fatal configuration error.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Recognized model domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelDomain {
    /// Danish census free text.
    #[serde(rename = "DK_CENSUS")]
    DkCensus,

    /// English marriage-certificate occupation strings.
    #[serde(rename = "EN_MARR_CERT")]
    EnMarrCert,

    /// Dutch Historical Sample of the Netherlands database.
    #[serde(rename = "HSN_DATABASE")]
    HsnDatabase,

    /// Mixed-language corpus, encoded with XLM-RoBERTa.
    #[serde(rename = "Multilingual")]
    Multilingual,
}

impl ModelDomain {
    /// All recognized domains, in table order.
    pub const ALL: [ModelDomain; 4] = [
        ModelDomain::DkCensus,
        ModelDomain::EnMarrCert,
        ModelDomain::HsnDatabase,
        ModelDomain::Multilingual,
    ];

    /// Parse a domain tag. Unrecognized tags fail with
    /// [`Error::UnsupportedDomain`].
    pub fn parse(tag: &str) -> Result<Self> {
        match tag {
            "DK_CENSUS" => Ok(ModelDomain::DkCensus),
            "EN_MARR_CERT" => Ok(ModelDomain::EnMarrCert),
            "HSN_DATABASE" => Ok(ModelDomain::HsnDatabase),
            "Multilingual" => Ok(ModelDomain::Multilingual),
            other => Err(Error::UnsupportedDomain(other.to_string())),
        }
    }

    /// The domain tag string.
    pub fn tag(&self) -> &'static str {
        match self {
            ModelDomain::DkCensus => "DK_CENSUS",
            ModelDomain::EnMarrCert => "EN_MARR_CERT",
            ModelDomain::HsnDatabase => "HSN_DATABASE",
            ModelDomain::Multilingual => "Multilingual",
        }
    }

    /// HuggingFace Hub reference of the pretrained encoder for this domain.
    pub fn pretrained_ref(&self) -> &'static str {
        match self {
            ModelDomain::DkCensus => "Maltehb/danish-bert-botxo",
            ModelDomain::EnMarrCert => "bert-base-uncased",
            ModelDomain::HsnDatabase => "GroNLP/bert-base-dutch-cased",
            ModelDomain::Multilingual => "xlm-roberta-base",
        }
    }

    /// Whether this domain's tokenizer is the SentencePiece-based XLM-RoBERTa
    /// family rather than BERT WordPiece.
    pub fn uses_sentencepiece(&self) -> bool {
        matches!(self, ModelDomain::Multilingual)
    }
}

impl fmt::Display for ModelDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn parse_all_recognized_tags() {
        for domain in ModelDomain::ALL {
            assert_eq!(ModelDomain::parse(domain.tag()).unwrap(), domain);
        }
    }

    #[test]
    fn pretrained_refs_distinct_and_nonempty() {
        let refs: HashSet<&str> = ModelDomain::ALL
            .iter()
            .map(|d| d.pretrained_ref())
            .collect();
        assert_eq!(refs.len(), 4);
        assert!(refs.iter().all(|r| !r.is_empty()));
    }

    #[test]
    fn unrecognized_tag_is_fatal() {
        let err = ModelDomain::parse("DE_CENSUS").unwrap_err();
        assert!(matches!(err, crate::Error::UnsupportedDomain(tag) if tag == "DE_CENSUS"));
    }

    #[test]
    fn only_multilingual_uses_sentencepiece() {
        assert!(ModelDomain::Multilingual.uses_sentencepiece());
        assert!(!ModelDomain::DkCensus.uses_sentencepiece());
        assert!(!ModelDomain::EnMarrCert.uses_sentencepiece());
        assert!(!ModelDomain::HsnDatabase.uses_sentencepiece());
    }

    #[test]
    fn serde_uses_domain_tags() {
        let json = serde_json::to_string(&ModelDomain::HsnDatabase).unwrap();
        assert_eq!(json, r#""HSN_DATABASE""#);
        let back: ModelDomain = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ModelDomain::HsnDatabase);
    }
}
