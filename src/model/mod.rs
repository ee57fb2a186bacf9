//! Scorers: each turns one feature representation into a phishing probability in [0, 1].
//!
//! Native models load from JSON artifacts. With the `onnx` feature any role can
//! instead be backed by an exported ONNX graph.

mod forest;
mod linear;
mod lstm;
#[cfg(feature = "onnx")]
mod onnx;

pub use forest::{DecisionTree, RandomForest};
pub use linear::LogisticRegression;
pub use lstm::{LstmClassifier, LstmWeights};
#[cfg(feature = "onnx")]
pub use onnx::OnnxScorer;

use crate::artifact::ArtifactFormat;
use crate::error::{DetectorError, Result};
use crate::features::{SparseVector, TokenSequence};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The three classifiers fused by the detector, in attribution tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    LinearModel,
    TreeEnsembleModel,
    SequenceModel,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::LinearModel,
        ModelKind::TreeEnsembleModel,
        ModelKind::SequenceModel,
    ];

    /// Name reported to callers as `model_stage`.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::LinearModel => "Logistic Regression",
            ModelKind::TreeEnsembleModel => "Random Forest",
            ModelKind::SequenceModel => "LSTM",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One classifier's phishing probability for one input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub model: ModelKind,
    pub probability: f64,
}

/// Given features of kind `F`, return the positive ("Phishing") class probability.
///
/// Implementations must be deterministic: the same features always yield the
/// same probability.
pub trait Scorer<F: ?Sized>: Send + Sync {
    fn kind(&self) -> ModelKind;

    fn score_probability(&self, features: &F) -> Result<f64>;
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Load a scorer over the TF-IDF space for the linear or tree role.
pub fn load_sparse_scorer(
    kind: ModelKind,
    path: &Path,
    n_features: usize,
) -> Result<Box<dyn Scorer<SparseVector>>> {
    match (ArtifactFormat::of(path)?, kind) {
        (ArtifactFormat::Json, ModelKind::LinearModel) => {
            Ok(Box::new(LogisticRegression::load(path, n_features)?))
        }
        (ArtifactFormat::Json, ModelKind::TreeEnsembleModel) => {
            Ok(Box::new(RandomForest::load(path, n_features)?))
        }
        (ArtifactFormat::Json, ModelKind::SequenceModel) => Err(DetectorError::configuration(
            path.display().to_string(),
            "sequence model cannot score sparse vectors",
        )),
        (ArtifactFormat::Onnx, kind) => load_onnx_sparse(kind, path, n_features),
    }
}

/// Load the sequence-role scorer.
pub fn load_sequence_scorer(
    path: &Path,
    vocab_size: usize,
    max_len: usize,
) -> Result<Box<dyn Scorer<TokenSequence>>> {
    match ArtifactFormat::of(path)? {
        ArtifactFormat::Json => Ok(Box::new(LstmClassifier::load(path, vocab_size)?)),
        ArtifactFormat::Onnx => load_onnx_sequence(path, max_len),
    }
}

#[cfg(feature = "onnx")]
fn load_onnx_sparse(kind: ModelKind, path: &Path, n_features: usize) -> Result<Box<dyn Scorer<SparseVector>>> {
    Ok(Box::new(OnnxScorer::load_sparse(kind, path, n_features)?))
}

#[cfg(feature = "onnx")]
fn load_onnx_sequence(path: &Path, max_len: usize) -> Result<Box<dyn Scorer<TokenSequence>>> {
    Ok(Box::new(OnnxScorer::load_sequence(path, max_len)?))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx_sparse(_kind: ModelKind, path: &Path, _n_features: usize) -> Result<Box<dyn Scorer<SparseVector>>> {
    Err(onnx_disabled(path))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx_sequence(path: &Path, _max_len: usize) -> Result<Box<dyn Scorer<TokenSequence>>> {
    Err(onnx_disabled(path))
}

#[cfg(not(feature = "onnx"))]
fn onnx_disabled(path: &Path) -> DetectorError {
    DetectorError::configuration(
        path.display().to_string(),
        "ONNX artifact but phishguard was built without the `onnx` feature",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_match_response_contract() {
        let names: Vec<String> = ModelKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(names, ["Logistic Regression", "Random Forest", "LSTM"]);
    }

    #[test]
    fn sigmoid_is_centered() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(20.0) > 0.999);
        assert!(sigmoid(-20.0) < 0.001);
    }

    #[test]
    fn sequence_role_rejected_for_sparse_json() {
        let err = load_sparse_scorer(ModelKind::SequenceModel, Path::new("lstm.json"), 10)
            .err()
            .unwrap();
        assert!(matches!(err, DetectorError::Configuration { .. }));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn onnx_artifact_needs_feature() {
        let err = load_sequence_scorer(Path::new("models/lstm.onnx"), 1000, 100)
            .err()
            .unwrap();
        assert!(err.to_string().contains("onnx"));
    }
}
