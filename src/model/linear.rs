//! Binary logistic regression over the TF-IDF space.

use super::{sigmoid, ModelKind, Scorer};
use crate::error::{DetectorError, Result};
use crate::features::SparseVector;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// One weight per TF-IDF column
    pub coef: Vec<f32>,
    pub intercept: f32,
}

impl LogisticRegression {
    pub fn load(path: &Path, n_features: usize) -> Result<Self> {
        let model: Self = crate::artifact::load_json(path)?;
        model
            .validate(n_features)
            .map_err(|reason| DetectorError::configuration(path.display().to_string(), reason))?;
        Ok(model)
    }

    fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        if self.coef.len() != n_features {
            return Err(format!(
                "{} coefficients but vectorizer produces {} features",
                self.coef.len(),
                n_features
            ));
        }
        if !self.intercept.is_finite() || self.coef.iter().any(|w| !w.is_finite()) {
            return Err("non-finite weights".into());
        }
        Ok(())
    }
}

impl Scorer<SparseVector> for LogisticRegression {
    fn kind(&self) -> ModelKind {
        ModelKind::LinearModel
    }

    fn score_probability(&self, features: &SparseVector) -> Result<f64> {
        if features.dim != self.coef.len() {
            return Err(DetectorError::scoring(
                self.kind(),
                format!("expected {} features, got {}", self.coef.len(), features.dim),
            ));
        }
        let z = features.dot(&self.coef) as f64 + self.intercept as f64;
        Ok(sigmoid(z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_vector_scores_intercept() {
        let m = LogisticRegression {
            coef: vec![2.0, -1.0, 0.5],
            intercept: 0.0,
        };
        assert_eq!(m.score_probability(&SparseVector::empty(3)).unwrap(), 0.5);
    }

    #[test]
    fn positive_weights_raise_probability() {
        let m = LogisticRegression {
            coef: vec![3.0, -3.0],
            intercept: -0.5,
        };
        let phishy = SparseVector {
            dim: 2,
            entries: vec![(0, 1.0)],
        };
        let benign = SparseVector {
            dim: 2,
            entries: vec![(1, 1.0)],
        };
        let p = m.score_probability(&phishy).unwrap();
        assert!((p - sigmoid(2.5)).abs() < 1e-9);
        assert!(m.score_probability(&benign).unwrap() < 0.5);
    }

    #[test]
    fn dimension_mismatch_rejected_at_load() {
        let m = LogisticRegression {
            coef: vec![0.1; 4],
            intercept: 0.0,
        };
        assert!(m.validate(4).is_ok());
        assert!(m.validate(1000).is_err());
    }
}
