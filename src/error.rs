//! Error taxonomy shared by the detector and its collaborators.

use crate::model::ModelKind;

/// Errors surfaced by feature extraction, scoring, and detector construction.
///
/// `Clone` so a failed one-time initialization can be handed back to every
/// later caller of a [`crate::detector::SharedDetector`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DetectorError {
    /// Artifact missing, corrupt, or dimensionally inconsistent. Fatal at load.
    #[error("configuration error in {artifact}: {reason}")]
    Configuration { artifact: String, reason: String },

    /// Caller handed the engine something it cannot score.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Numerical failure inside a scorer. Never retried.
    #[error("{model} scoring failed: {reason}")]
    Scoring { model: ModelKind, reason: String },
}

impl DetectorError {
    pub fn configuration(artifact: impl Into<String>, reason: impl ToString) -> Self {
        Self::Configuration {
            artifact: artifact.into(),
            reason: reason.to_string(),
        }
    }

    pub fn scoring(model: ModelKind, reason: impl ToString) -> Self {
        Self::Scoring {
            model,
            reason: reason.to_string(),
        }
    }

    /// HTTP-style status class a request handler should answer with.
    pub fn status_class(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::Configuration { .. } | Self::Scoring { .. } => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, DetectorError>;
