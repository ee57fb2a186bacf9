//! Response payload handed back to web / CLI callers.

use super::Verdict;
use serde::{Deserialize, Serialize};

/// Only one fusion stage exists; the field stays for older clients.
const STAGE_NUMBER: u8 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: String,
    pub confidence: f64,
    pub model_stage: String,
    pub stage_number: u8,
}

impl From<&Verdict> for PredictionResponse {
    fn from(v: &Verdict) -> Self {
        Self {
            prediction: v.label.as_str().to_string(),
            confidence: v.confidence,
            model_stage: v.attributed_model.display_name().to_string(),
            stage_number: STAGE_NUMBER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::fuse;

    #[test]
    fn serializes_legacy_field_names() {
        let resp = PredictionResponse::from(&fuse(0.95, 0.9, 0.2));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["prediction"], "Phishing");
        assert_eq!(json["model_stage"], "Random Forest");
        assert_eq!(json["stage_number"], 1);
        assert!(json["confidence"].as_f64().unwrap() > 0.5);
    }
}
