//! Prediction log persistence. Owned by callers; the detector never writes here.

mod encrypted;

pub use encrypted::{PredictionLogEntry, PredictionStore};
