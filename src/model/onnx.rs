//! ONNX Runtime backend for any scorer role. Input: `[1, width]` f32, output: class
//! probabilities `[1, 2]` or a single sigmoid score `[1, 1]`.

use super::{ModelKind, Scorer};
use crate::error::{DetectorError, Result};
use crate::features::{SparseVector, TokenSequence};
use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;

pub struct OnnxScorer {
    kind: ModelKind,
    // ort sessions need exclusive access per run
    session: Mutex<Session>,
    output_name: String,
    width: usize,
}

impl OnnxScorer {
    /// Linear or tree role over `n_features` TF-IDF columns.
    pub fn load_sparse(kind: ModelKind, path: &Path, n_features: usize) -> Result<Self> {
        Self::load(kind, path, n_features)
    }

    /// Sequence role over `max_len` token ids.
    pub fn load_sequence(path: &Path, max_len: usize) -> Result<Self> {
        Self::load(ModelKind::SequenceModel, path, max_len)
    }

    fn load(kind: ModelKind, path: &Path, width: usize) -> Result<Self> {
        let artifact = path.display().to_string();
        let bytes = crate::artifact::read_bytes(path)?;
        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.commit_from_memory(&bytes))
            .map_err(|e| DetectorError::configuration(artifact.clone(), e))?;

        // Classifier exports put probabilities last, after the predicted label
        let output_name = session
            .outputs
            .last()
            .map(|o| o.name.clone())
            .ok_or_else(|| DetectorError::configuration(artifact.clone(), "graph has no outputs"))?;

        let scorer = Self {
            kind,
            session: Mutex::new(session),
            output_name,
            width,
        };

        // A probe run catches shape mismatches at load instead of per request.
        scorer
            .run(vec![0.0; width])
            .map_err(|e| DetectorError::configuration(artifact, e))?;
        tracing::info!(model = %kind, width, "ONNX scorer ready");
        Ok(scorer)
    }

    fn run(&self, values: Vec<f32>) -> std::result::Result<f64, String> {
        let input = Array2::<f32>::from_shape_vec((1, self.width), values).map_err(|e| e.to_string())?;
        let tensor = Value::from_array(input).map_err(|e| e.to_string())?;

        let mut session = self.session.lock().map_err(|_| "session lock poisoned".to_string())?;
        let outputs = session.run(ort::inputs![tensor]).map_err(|e| e.to_string())?;
        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| format!("missing output {}", self.output_name))?;
        let (shape, data) = output.try_extract_tensor::<f32>().map_err(|e| e.to_string())?;

        let p = match shape.last() {
            Some(2) => data.get(1),
            _ => data.first(),
        }
        .copied()
        .ok_or_else(|| "empty output tensor".to_string())?;
        Ok(p as f64)
    }

    fn score(&self, values: Vec<f32>) -> Result<f64> {
        self.run(values).map_err(|e| DetectorError::scoring(self.kind, e))
    }
}

impl Scorer<SparseVector> for OnnxScorer {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn score_probability(&self, features: &SparseVector) -> Result<f64> {
        if features.dim != self.width {
            return Err(DetectorError::scoring(
                self.kind,
                format!("expected {} features, got {}", self.width, features.dim),
            ));
        }
        self.score(features.to_dense())
    }
}

impl Scorer<TokenSequence> for OnnxScorer {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn score_probability(&self, features: &TokenSequence) -> Result<f64> {
        if features.len() != self.width {
            return Err(DetectorError::scoring(
                self.kind,
                format!("expected {} tokens, got {}", self.width, features.len()),
            ));
        }
        self.score(features.as_slice().iter().map(|&id| id as f32).collect())
    }
}
