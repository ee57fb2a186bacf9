//! Embedding → LSTM → sigmoid dense classifier over padded token sequences.

use super::{sigmoid, ModelKind, Scorer};
use crate::error::{DetectorError, Result};
use crate::features::TokenSequence;
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serialized weights. Gate blocks in `kernel`, `recurrent_kernel` and `bias`
/// are ordered input, forget, cell, output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmWeights {
    /// `[vocab, embed_dim]`
    pub embedding: Vec<Vec<f32>>,
    /// `[embed_dim, 4 * units]`
    pub kernel: Vec<Vec<f32>>,
    /// `[units, 4 * units]`
    pub recurrent_kernel: Vec<Vec<f32>>,
    /// `[4 * units]`
    pub bias: Vec<f32>,
    /// `[units]`
    pub dense_kernel: Vec<f32>,
    pub dense_bias: f32,
}

pub struct LstmClassifier {
    embedding: Array2<f32>,
    kernel: Array2<f32>,
    recurrent: Array2<f32>,
    bias: Array1<f32>,
    dense: Array1<f32>,
    dense_bias: f32,
    units: usize,
}

fn matrix(rows: Vec<Vec<f32>>, name: &str) -> std::result::Result<Array2<f32>, String> {
    let n_rows = rows.len();
    let n_cols = rows.first().map(Vec::len).unwrap_or(0);
    if n_rows == 0 || n_cols == 0 {
        return Err(format!("{} is empty", name));
    }
    if rows.iter().any(|r| r.len() != n_cols) {
        return Err(format!("{} has ragged rows", name));
    }
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    if flat.iter().any(|v| !v.is_finite()) {
        return Err(format!("{} has non-finite weights", name));
    }
    Array2::from_shape_vec((n_rows, n_cols), flat).map_err(|e| format!("{}: {}", name, e))
}

fn gate(x: f32) -> f32 {
    sigmoid(f64::from(x)) as f32
}

impl LstmClassifier {
    pub fn load(path: &Path, vocab_size: usize) -> Result<Self> {
        let weights: LstmWeights = crate::artifact::load_json(path)?;
        Self::from_weights(weights, vocab_size)
            .map_err(|reason| DetectorError::configuration(path.display().to_string(), reason))
    }

    /// Build from weights; `vocab_size` is the tokenizer's id bound the embedding must cover.
    pub fn from_weights(w: LstmWeights, vocab_size: usize) -> std::result::Result<Self, String> {
        let embedding = matrix(w.embedding, "embedding")?;
        let kernel = matrix(w.kernel, "kernel")?;
        let recurrent = matrix(w.recurrent_kernel, "recurrent_kernel")?;
        let units = recurrent.nrows();

        if embedding.nrows() < vocab_size {
            return Err(format!(
                "embedding has {} rows but tokenizer emits ids up to {}",
                embedding.nrows(),
                vocab_size
            ));
        }
        if kernel.nrows() != embedding.ncols() {
            return Err(format!(
                "kernel expects {} inputs, embedding yields {}",
                kernel.nrows(),
                embedding.ncols()
            ));
        }
        if kernel.ncols() != 4 * units || recurrent.ncols() != 4 * units {
            return Err(format!("gate width must be 4 x {} units", units));
        }
        if w.bias.len() != 4 * units {
            return Err(format!("bias has {} entries, expected {}", w.bias.len(), 4 * units));
        }
        if w.dense_kernel.len() != units {
            return Err(format!("dense kernel has {} entries, expected {}", w.dense_kernel.len(), units));
        }
        if !w.dense_bias.is_finite() || w.bias.iter().chain(&w.dense_kernel).any(|v| !v.is_finite()) {
            return Err("non-finite bias or dense weights".into());
        }

        Ok(Self {
            embedding,
            kernel,
            recurrent,
            bias: Array1::from(w.bias),
            dense: Array1::from(w.dense_kernel),
            dense_bias: w.dense_bias,
            units,
        })
    }

    pub fn units(&self) -> usize {
        self.units
    }
}

impl Scorer<TokenSequence> for LstmClassifier {
    fn kind(&self) -> ModelKind {
        ModelKind::SequenceModel
    }

    fn score_probability(&self, features: &TokenSequence) -> Result<f64> {
        let u = self.units;
        let mut h = Array1::<f32>::zeros(u);
        let mut c = Array1::<f32>::zeros(u);

        for &id in features.as_slice() {
            if id as usize >= self.embedding.nrows() {
                return Err(DetectorError::scoring(
                    self.kind(),
                    format!("token id {} outside embedding", id),
                ));
            }
            let x = self.embedding.row(id as usize);
            let z = x.dot(&self.kernel) + h.dot(&self.recurrent) + &self.bias;

            let i = z.slice(s![0..u]).mapv(gate);
            let f = z.slice(s![u..2 * u]).mapv(gate);
            let g = z.slice(s![2 * u..3 * u]).mapv(f32::tanh);
            let o = z.slice(s![3 * u..4 * u]).mapv(gate);

            c = &f * &c + &i * &g;
            h = &o * &c.mapv(f32::tanh);
        }

        let p = sigmoid(f64::from(h.dot(&self.dense) + self.dense_bias));
        if p.is_finite() {
            Ok(p)
        } else {
            Err(DetectorError::scoring(self.kind(), "non-finite output"))
        }
    }
}
