//! phishguard: ensemble phishing detector for email and URL text.
//!
//! Modular structure:
//! - [`features`]: TF-IDF vectors and padded token sequences from raw text
//! - [`model`]: logistic regression, random forest, and LSTM scorers
//! - [`fusion`]: average / threshold / attribution into a [`Verdict`]
//! - [`detector`]: load-once façade exposing `predict`
//! - [`input`], [`mail`]: caller-side framing of pasted text, URLs, and fetched mail
//! - [`storage`]: encrypted prediction log
//! - [`dataset`]: labeled CSV export of fetched mail
//! - [`logging`]: structured JSON logging

pub mod artifact;
pub mod config;
pub mod dataset;
pub mod detector;
pub mod error;
pub mod features;
pub mod fusion;
pub mod input;
pub mod logging;
pub mod mail;
pub mod model;
pub mod storage;

pub use config::DetectorConfig;
pub use detector::{PhishingDetector, SharedDetector};
pub use error::DetectorError;
pub use features::{FeatureExtractor, SparseVector, TokenSequence};
pub use fusion::{Label, PredictionResponse, Verdict};
pub use input::RawInput;
pub use logging::StructuredLogger;
pub use model::{ModelKind, ModelScore, Scorer};
pub use storage::PredictionStore;
