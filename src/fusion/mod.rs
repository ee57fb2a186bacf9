//! Verdict fusion and the caller-facing response payload.

mod engine;
mod response;

pub use engine::{attribute, fuse, Label, Verdict, DECISION_THRESHOLD};
pub use response::PredictionResponse;
