//! Fitted TF-IDF vectorizer: lowercase → word tokens → vocabulary lookup → tf × idf → norm.

use super::SparseVector;
use crate::error::{DetectorError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Tokens of two or more word characters.
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("word pattern"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    L1,
    None,
}

/// Vectorizer parameters fixed at training time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// term → column index
    pub vocabulary: HashMap<String, u32>,
    /// Inverse document frequency per column
    pub idf: Vec<f32>,
    #[serde(default)]
    pub stop_words: HashSet<String>,
    #[serde(default = "default_lowercase")]
    pub lowercase: bool,
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default)]
    pub norm: Norm,
}

fn default_lowercase() -> bool {
    true
}

impl TfidfVectorizer {
    pub fn load(path: &Path) -> Result<Self> {
        let v: Self = crate::artifact::load_json(path)?;
        v.validate()
            .map_err(|reason| DetectorError::configuration(path.display().to_string(), reason))?;
        Ok(v)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.idf.is_empty() {
            return Err("empty idf table".into());
        }
        if let Some((term, idx)) = self
            .vocabulary
            .iter()
            .find(|(_, &idx)| idx as usize >= self.idf.len())
        {
            return Err(format!(
                "term {:?} maps to column {} but idf has {} columns",
                term,
                idx,
                self.idf.len()
            ));
        }
        if self.idf.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("idf weights must be finite and non-negative".into());
        }
        Ok(())
    }

    /// Number of columns every scorer over this space must accept.
    pub fn dim(&self) -> usize {
        self.idf.len()
    }

    pub fn to_sparse_vector(&self, text: &str) -> SparseVector {
        let lowered;
        let text = if self.lowercase {
            lowered = text.to_lowercase();
            lowered.as_str()
        } else {
            text
        };

        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();
        for m in WORD.find_iter(text) {
            let term = m.as_str();
            if self.stop_words.contains(term) {
                continue;
            }
            if let Some(&idx) = self.vocabulary.get(term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(u32, f32)> = counts
            .into_iter()
            .map(|(idx, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (idx, tf * self.idf[idx as usize])
            })
            .filter(|&(_, w)| w > 0.0)
            .collect();

        let scale = match self.norm {
            Norm::L2 => entries.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt(),
            Norm::L1 => entries.iter().map(|&(_, w)| w).sum::<f32>(),
            Norm::None => 1.0,
        };
        if scale > 0.0 && scale != 1.0 {
            for e in &mut entries {
                e.1 /= scale;
            }
        }

        SparseVector {
            dim: self.dim(),
            entries,
        }
    }
}
