//! Read-only loading of persisted, pre-trained artifacts.

use crate::error::{DetectorError, Result};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::path::Path;

/// On-disk encoding of an artifact, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Onnx,
}

impl ArtifactFormat {
    pub fn of(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("onnx") => Ok(Self::Onnx),
            _ => Err(DetectorError::configuration(
                path.display().to_string(),
                "unsupported artifact extension (expected .json or .onnx)",
            )),
        }
    }
}

/// Read the raw bytes of an artifact and log its fingerprint.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path)
        .map_err(|e| DetectorError::configuration(path.display().to_string(), e))?;
    tracing::info!(
        path = %path.display(),
        bytes = bytes.len(),
        sha256 = %fingerprint(&bytes),
        "artifact loaded"
    );
    Ok(bytes)
}

/// Deserialize a JSON artifact.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = read_bytes(path)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| DetectorError::configuration(path.display().to_string(), e))
}

pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
