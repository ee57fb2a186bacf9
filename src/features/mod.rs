//! Text feature extraction: raw text → sparse TF-IDF vector and fixed-length token sequence.

mod pipeline;
mod tfidf;
mod tokenizer;

pub use pipeline::{FeatureExtractor, TextFeatures};
pub use tfidf::{Norm, TfidfVectorizer};
pub use tokenizer::{pad_sequence, SequenceTokenizer, PADDING_ID};

use serde::{Deserialize, Serialize};

/// Sparse weighted term vector over a vocabulary fixed at training time.
///
/// Entries are sorted by index and hold strictly positive weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub dim: usize,
    pub entries: Vec<(u32, f32)>,
}

impl SparseVector {
    pub fn empty(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
        }
    }

    /// Number of active (non-zero) terms
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Weight at `index`, 0.0 when the term is absent.
    pub fn get(&self, index: usize) -> f32 {
        self.entries
            .binary_search_by_key(&index, |&(i, _)| i as usize)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    /// Dot product with a dense weight row of length `dim`.
    pub fn dot(&self, weights: &[f32]) -> f32 {
        self.entries
            .iter()
            .filter_map(|&(i, v)| weights.get(i as usize).map(|w| w * v))
            .sum()
    }

    pub fn to_dense(&self) -> Vec<f32> {
        let mut out = vec![0.0f32; self.dim];
        for &(i, v) in &self.entries {
            if let Some(slot) = out.get_mut(i as usize) {
                *slot = v;
            }
        }
        out
    }
}

/// Fixed-length sequence of token ids; padding uses [`PADDING_ID`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSequence {
    pub ids: Vec<u32>,
}

impl TokenSequence {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_all_padding(&self) -> bool {
        self.ids.iter().all(|&id| id == PADDING_ID)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.ids
    }
}
