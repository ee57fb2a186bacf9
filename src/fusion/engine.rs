//! Combines the three model probabilities into a verdict: average, threshold, attribute.

use crate::model::{ModelKind, ModelScore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Averages at or above this are phishing.
pub const DECISION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Phishing,
    Legitimate,
}

impl Label {
    pub fn from_average(average: f64) -> Self {
        if average >= DECISION_THRESHOLD {
            Label::Phishing
        } else {
            Label::Legitimate
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Phishing => "Phishing",
            Label::Legitimate => "Legitimate",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fused decision for one input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: Label,
    /// Probability mass behind `label`, always in [0.5, 1]
    pub confidence: f64,
    /// Model whose own probability sits closest to the average
    pub attributed_model: ModelKind,
    pub average: f64,
    /// Individual probabilities in [`ModelKind::ALL`] order
    pub scores: [ModelScore; 3],
}

/// Fuse linear, tree and sequence probabilities (in that order).
pub fn fuse(linear: f64, tree: f64, sequence: f64) -> Verdict {
    let scores = [
        ModelScore {
            model: ModelKind::LinearModel,
            probability: linear,
        },
        ModelScore {
            model: ModelKind::TreeEnsembleModel,
            probability: tree,
        },
        ModelScore {
            model: ModelKind::SequenceModel,
            probability: sequence,
        },
    ];
    let average = (linear + tree + sequence) / 3.0;
    let label = Label::from_average(average);
    let confidence = match label {
        Label::Phishing => average,
        Label::Legitimate => 1.0 - average,
    };

    Verdict {
        label,
        confidence,
        attributed_model: attribute(&scores, average),
        average,
        scores,
    }
}

/// Model with the minimum `|p - average|`; the earliest one wins ties.
pub fn attribute(scores: &[ModelScore; 3], average: f64) -> ModelKind {
    let mut best = scores[0];
    for s in &scores[1..] {
        if (s.probability - average).abs() < (best.probability - average).abs() {
            best = *s;
        }
    }
    best.model
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn confident_phishing() {
        let v = fuse(0.9, 0.8, 0.7);
        assert_eq!(v.label, Label::Phishing);
        assert!(close(v.average, 0.8));
        assert!(close(v.confidence, 0.8));
        assert_eq!(v.attributed_model, ModelKind::TreeEnsembleModel);
    }

    #[test]
    fn confident_legitimate() {
        let v = fuse(0.1, 0.2, 0.3);
        assert_eq!(v.label, Label::Legitimate);
        assert!(close(v.average, 0.2));
        assert!(close(v.confidence, 0.8));
        assert_eq!(v.attributed_model, ModelKind::TreeEnsembleModel);
    }

    #[test]
    fn average_on_threshold_is_phishing() {
        let v = fuse(0.25, 0.75, 0.5);
        assert_eq!(v.average, 0.5);
        assert_eq!(v.label, Label::Phishing);
        assert_eq!(v.confidence, 0.5);
        assert_eq!(v.attributed_model, ModelKind::SequenceModel);
    }

    #[test]
    fn identical_scores_attribute_first_model() {
        let v = fuse(0.4, 0.4, 0.4);
        assert_eq!(v.attributed_model, ModelKind::LinearModel);
        assert_eq!(v.label, Label::Legitimate);
    }

    #[test]
    fn equidistant_scores_keep_listed_order() {
        assert_eq!(fuse(0.2, 0.6, 0.2).attributed_model, ModelKind::LinearModel);
        assert_eq!(fuse(0.0, 0.0, 0.9).attributed_model, ModelKind::LinearModel);
        assert_eq!(fuse(0.9, 0.0, 0.0).attributed_model, ModelKind::TreeEnsembleModel);
    }

    #[test]
    fn confidence_never_below_half() {
        let grid = [0.0, 0.1, 0.33, 0.5, 0.51, 0.77, 1.0];
        for &a in &grid {
            for &b in &grid {
                for &c in &grid {
                    let v = fuse(a, b, c);
                    assert!(v.confidence >= 0.5 && v.confidence <= 1.0, "{:?}", v);
                    let best = (v.scores.iter().find(|s| s.model == v.attributed_model).unwrap().probability
                        - v.average)
                        .abs();
                    assert!(v.scores.iter().all(|s| (s.probability - v.average).abs() >= best));
                }
            }
        }
    }

    #[test]
    fn scores_keep_fixed_order() {
        let v = fuse(0.3, 0.6, 0.9);
        let kinds: Vec<ModelKind> = v.scores.iter().map(|s| s.model).collect();
        assert_eq!(kinds, ModelKind::ALL);
    }
}
