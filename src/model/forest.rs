//! Random forest of binary decision trees over the TF-IDF space.
//!
//! Trees use the flat array-of-nodes layout: node `i` is a leaf when
//! `children_left[i] == -1`; otherwise samples with
//! `x[feature[i]] <= threshold[i]` go left.

use super::{ModelKind, Scorer};
use crate::error::{DetectorError, Result};
use crate::features::SparseVector;
use serde::{Deserialize, Serialize};
use std::path::Path;

const LEAF: i32 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i32>,
    pub children_right: Vec<i32>,
    pub feature: Vec<i32>,
    /// Split thresholds at the training precision; features widen before comparing
    pub threshold: Vec<f64>,
    /// Per-node class weights `[legitimate, phishing]`
    pub value: Vec<[f32; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl DecisionTree {
    fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err("node arrays differ in length".into());
        }
        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF || right == LEAF {
                if left != right {
                    return Err(format!("node {} has exactly one child", node));
                }
                let [neg, pos] = self.value[node];
                if !(neg >= 0.0 && pos >= 0.0 && neg + pos > 0.0) {
                    return Err(format!("leaf {} has no class weight", node));
                }
                continue;
            }
            // Children always follow their parent, so traversal cannot cycle.
            for child in [left, right] {
                if child as usize <= node || child as usize >= n {
                    return Err(format!("node {} has out-of-order child {}", node, child));
                }
            }
            let f = self.feature[node];
            if f < 0 || f as usize >= n_features {
                return Err(format!("node {} splits on feature {} of {}", node, f, n_features));
            }
            if !self.threshold[node].is_finite() {
                return Err(format!("node {} has non-finite threshold", node));
            }
        }
        Ok(())
    }

    /// Phishing share of the leaf `x` lands in.
    pub fn predict(&self, x: &SparseVector) -> f64 {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let value = x.get(self.feature[node] as usize);
            node = if f64::from(value) <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        let [neg, pos] = self.value[node];
        pos as f64 / (neg as f64 + pos as f64)
    }
}

impl RandomForest {
    pub fn load(path: &Path, n_features: usize) -> Result<Self> {
        let model: Self = crate::artifact::load_json(path)?;
        model
            .validate(n_features)
            .map_err(|reason| DetectorError::configuration(path.display().to_string(), reason))?;
        Ok(model)
    }

    fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        if self.n_features != n_features {
            return Err(format!(
                "forest trained on {} features but vectorizer produces {}",
                self.n_features, n_features
            ));
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features).map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }
}

impl Scorer<SparseVector> for RandomForest {
    fn kind(&self) -> ModelKind {
        ModelKind::TreeEnsembleModel
    }

    fn score_probability(&self, features: &SparseVector) -> Result<f64> {
        if features.dim != self.n_features {
            return Err(DetectorError::scoring(
                self.kind(),
                format!("expected {} features, got {}", self.n_features, features.dim),
            ));
        }
        let total: f64 = self.trees.iter().map(|t| t.predict(features)).sum();
        Ok(total / self.trees.len() as f64)
    }
}
