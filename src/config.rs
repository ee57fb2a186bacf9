//! Detector configuration. Artifact locations are a packaging concern; the engine
//! only sees the resolved paths.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Trained model artifacts
    pub models: ModelsConfig,
    /// Prediction log persistence
    pub store: StoreConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory the artifact file names below are resolved against
    pub models_dir: PathBuf,
    /// Logistic regression over TF-IDF features (`.json` or `.onnx`)
    pub linear: PathBuf,
    /// Random forest over TF-IDF features (`.json` or `.onnx`)
    pub tree: PathBuf,
    /// Fitted TF-IDF vectorizer
    pub vectorizer: PathBuf,
    /// Fitted word tokenizer
    pub tokenizer: PathBuf,
    /// LSTM over token sequences (`.json` or `.onnx`)
    pub sequence: PathBuf,
    /// Token sequence length fed to the sequence model
    pub max_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub enabled: bool,
    pub path: PathBuf,
    /// Characters of the originating text kept per log entry
    pub text_limit: usize,
    /// Secret the column encryption key is derived from
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            models: ModelsConfig::default(),
            store: StoreConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models"),
            linear: PathBuf::from("lr_model.json"),
            tree: PathBuf::from("rf_model.json"),
            vectorizer: PathBuf::from("tfidf_vectorizer.json"),
            tokenizer: PathBuf::from("tokenizer.json"),
            sequence: PathBuf::from("lstm_model.json"),
            max_len: 100,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("predictions.db"),
            text_limit: 500,
            secret: "device-secret-placeholder".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl ModelsConfig {
    /// Config rooted at `dir` with default artifact names.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.models_dir.join(file)
        }
    }
}

impl DetectorConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|data| serde_json::from_str::<DetectorConfig>(&data).map_err(|e| e.to_string()));
        match parsed {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable config; using defaults");
                Self::default()
            }
        }
    }
}
