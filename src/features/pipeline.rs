//! Feature extraction pipeline: text → (TF-IDF vector, padded token sequence).

use super::{SequenceTokenizer, SparseVector, TfidfVectorizer, TokenSequence};
use crate::config::ModelsConfig;
use crate::error::{DetectorError, Result};

/// Both representations of one input, computed once and shared by the scorers.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFeatures {
    pub sparse: SparseVector,
    pub sequence: TokenSequence,
}

pub struct FeatureExtractor {
    vectorizer: TfidfVectorizer,
    tokenizer: SequenceTokenizer,
    max_len: usize,
}

impl FeatureExtractor {
    pub fn new(vectorizer: TfidfVectorizer, tokenizer: SequenceTokenizer, max_len: usize) -> Result<Self> {
        if max_len == 0 {
            return Err(DetectorError::configuration("max_len", "sequence length must be positive"));
        }
        Ok(Self {
            vectorizer,
            tokenizer,
            max_len,
        })
    }

    /// Load the fitted vectorizer and tokenizer named by `config`.
    pub fn load(config: &ModelsConfig) -> Result<Self> {
        let vectorizer = TfidfVectorizer::load(&config.resolve(&config.vectorizer))?;
        let tokenizer = SequenceTokenizer::load(&config.resolve(&config.tokenizer))?;
        Self::new(vectorizer, tokenizer, config.max_len)
    }

    pub fn to_sparse_vector(&self, text: &str) -> SparseVector {
        self.vectorizer.to_sparse_vector(text)
    }

    pub fn to_token_sequence(&self, text: &str) -> TokenSequence {
        self.tokenizer.to_token_sequence(text, self.max_len)
    }

    pub fn extract(&self, text: &str) -> TextFeatures {
        TextFeatures {
            sparse: self.to_sparse_vector(text),
            sequence: self.to_token_sequence(text),
        }
    }

    /// Width of the sparse feature space.
    pub fn sparse_dim(&self) -> usize {
        self.vectorizer.dim()
    }

    /// Exclusive upper bound on token ids.
    pub fn vocab_size(&self) -> usize {
        self.tokenizer.vocab_size()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}
