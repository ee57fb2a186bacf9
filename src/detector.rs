//! Detector façade: feature extraction → three scorers → fusion.
//!
//! [`PhishingDetector`] is built eagerly from artifacts and is immutable
//! afterwards, so `predict` can be called from any number of threads.
//! [`SharedDetector`] defers that construction to first use and guarantees it
//! happens exactly once, remembering a failure instead of retrying.

use crate::config::ModelsConfig;
use crate::error::{DetectorError, Result};
use crate::features::{FeatureExtractor, SparseVector, TokenSequence};
use crate::fusion::{fuse, Verdict};
use crate::input::RawInput;
use crate::model::{self, ModelKind, ModelScore, Scorer};
use once_cell::sync::OnceCell;
use tracing::{debug, error, info};

pub struct PhishingDetector {
    features: FeatureExtractor,
    linear: Box<dyn Scorer<SparseVector>>,
    tree: Box<dyn Scorer<SparseVector>>,
    sequence: Box<dyn Scorer<TokenSequence>>,
}

fn checked(kind: ModelKind, p: f64) -> Result<f64> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(DetectorError::scoring(kind, format!("probability {} outside [0, 1]", p)))
    }
}

impl PhishingDetector {
    /// Load every artifact named by `config`. Any failure aborts construction.
    pub fn load(config: &ModelsConfig) -> Result<Self> {
        info!(models_dir = %config.models_dir.display(), "initializing phishing detector");
        Self::load_parts(config).map_err(|e| {
            error!(error = %e, "detector initialization failed");
            e
        })
    }

    fn load_parts(config: &ModelsConfig) -> Result<Self> {
        let features = FeatureExtractor::load(config)?;
        let dim = features.sparse_dim();
        let linear = model::load_sparse_scorer(ModelKind::LinearModel, &config.resolve(&config.linear), dim)?;
        let tree = model::load_sparse_scorer(ModelKind::TreeEnsembleModel, &config.resolve(&config.tree), dim)?;
        let sequence = model::load_sequence_scorer(
            &config.resolve(&config.sequence),
            features.vocab_size(),
            features.max_len(),
        )?;
        info!(
            sparse_dim = dim,
            vocab_size = features.vocab_size(),
            max_len = features.max_len(),
            "phishing detector ready"
        );
        Ok(Self::from_parts(features, linear, tree, sequence))
    }

    /// Assemble from already-loaded parts.
    pub fn from_parts(
        features: FeatureExtractor,
        linear: Box<dyn Scorer<SparseVector>>,
        tree: Box<dyn Scorer<SparseVector>>,
        sequence: Box<dyn Scorer<TokenSequence>>,
    ) -> Self {
        Self {
            features,
            linear,
            tree,
            sequence,
        }
    }

    /// Individual model probabilities in [`ModelKind::ALL`] order.
    pub fn scores(&self, text: &str) -> Result<[ModelScore; 3]> {
        let f = self.features.extract(text);
        let linear = checked(ModelKind::LinearModel, self.linear.score_probability(&f.sparse)?)?;
        let tree = checked(ModelKind::TreeEnsembleModel, self.tree.score_probability(&f.sparse)?)?;
        let sequence = checked(ModelKind::SequenceModel, self.sequence.score_probability(&f.sequence)?)?;
        debug!(
            active_terms = f.sparse.nnz(),
            linear, tree, sequence, "model scores"
        );
        Ok([
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
        ])
    }

    pub fn predict(&self, text: &str) -> Result<Verdict> {
        let [linear, tree, sequence] = self.scores(text)?;
        let verdict = fuse(linear.probability, tree.probability, sequence.probability);
        debug!(
            label = %verdict.label,
            confidence = verdict.confidence,
            attributed = %verdict.attributed_model,
            "verdict"
        );
        Ok(verdict)
    }

    /// Score raw bytes; anything that is not UTF-8 is `InvalidInput`.
    pub fn predict_bytes(&self, bytes: &[u8]) -> Result<Verdict> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| DetectorError::InvalidInput(format!("input is not UTF-8 text: {}", e)))?;
        self.predict(text)
    }

    pub fn predict_input(&self, input: &RawInput) -> Result<Verdict> {
        self.predict(input.as_str())
    }

    pub fn features(&self) -> &FeatureExtractor {
        &self.features
    }
}

type Loader = Box<dyn Fn() -> Result<PhishingDetector> + Send + Sync>;

/// Lazily constructed, process-shared detector. Pass it to request handlers
/// explicitly; there is no global instance.
pub struct SharedDetector {
    loader: Loader,
    cell: OnceCell<Result<PhishingDetector>>,
}

impl SharedDetector {
    pub fn new(config: ModelsConfig) -> Self {
        Self::with_loader(move || PhishingDetector::load(&config))
    }

    pub fn with_loader(loader: impl Fn() -> Result<PhishingDetector> + Send + Sync + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            cell: OnceCell::new(),
        }
    }

    /// The loaded detector, initializing on first call. Concurrent first
    /// callers block until the single load finishes.
    pub fn get(&self) -> Result<&PhishingDetector> {
        match self.cell.get_or_init(|| (self.loader)()) {
            Ok(detector) => Ok(detector),
            Err(e) => Err(e.clone()),
        }
    }

    pub fn predict(&self, text: &str) -> Result<Verdict> {
        self.get()?.predict(text)
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}
