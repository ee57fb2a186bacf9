//! Fitted word tokenizer producing fixed-length id sequences for the sequence model.

use super::TokenSequence;
use crate::error::{DetectorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Reserved id used for left padding. Never assigned to a word.
pub const PADDING_ID: u32 = 0;

const DEFAULT_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceTokenizer {
    /// word → id, ids start at 1 and are ranked by training frequency
    pub word_index: HashMap<String, u32>,
    /// Only ids below this bound are emitted
    #[serde(default)]
    pub num_words: Option<usize>,
    /// Characters replaced by `split` before splitting
    #[serde(default = "default_filters")]
    pub filters: String,
    /// Word separator; only this string separates words
    #[serde(default = "default_split")]
    pub split: String,
    #[serde(default = "default_lower")]
    pub lower: bool,
    /// Token substituted for unknown or out-of-range words, when set
    #[serde(default)]
    pub oov_token: Option<String>,
}

fn default_filters() -> String {
    DEFAULT_FILTERS.to_string()
}

fn default_split() -> String {
    " ".to_string()
}

fn default_lower() -> bool {
    true
}

impl SequenceTokenizer {
    pub fn load(path: &Path) -> Result<Self> {
        let t: Self = crate::artifact::load_json(path)?;
        t.validate()
            .map_err(|reason| DetectorError::configuration(path.display().to_string(), reason))?;
        Ok(t)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.word_index.values().any(|&id| id == PADDING_ID) {
            return Err("word_index assigns the reserved padding id 0".into());
        }
        if let Some(oov) = &self.oov_token {
            if !self.word_index.contains_key(oov) {
                return Err(format!("oov token {:?} missing from word_index", oov));
            }
        }
        if self.num_words == Some(0) {
            return Err("num_words must be positive".into());
        }
        if self.split.is_empty() {
            return Err("split separator is empty".into());
        }
        Ok(())
    }

    /// Exclusive upper bound on emitted ids (embedding rows the sequence model needs).
    /// The oov id is emitted even when it lies past `num_words`.
    pub fn vocab_size(&self) -> usize {
        let bound = match self.num_words {
            Some(n) => n,
            None => self.word_index.values().copied().max().unwrap_or(0) as usize + 1,
        };
        match self.oov_id() {
            Some(oov) => bound.max(oov as usize + 1),
            None => bound,
        }
    }

    fn oov_id(&self) -> Option<u32> {
        self.oov_token
            .as_ref()
            .and_then(|t| self.word_index.get(t).copied())
    }

    /// Map words to ids, without padding or truncation.
    pub fn text_to_ids(&self, text: &str) -> Vec<u32> {
        let lowered;
        let text = if self.lower {
            lowered = text.to_lowercase();
            lowered.as_str()
        } else {
            text
        };
        let mut cleaned = String::with_capacity(text.len());
        for c in text.chars() {
            if self.filters.contains(c) {
                cleaned.push_str(&self.split);
            } else {
                cleaned.push(c);
            }
        }

        let bound = self.num_words.map(|n| n as u32);
        let oov = self.oov_id();
        cleaned
            .split(self.split.as_str())
            .filter(|word| !word.is_empty())
            .filter_map(|word| match self.word_index.get(word) {
                Some(&id) if bound.map_or(true, |b| id < b) => Some(id),
                _ => oov,
            })
            .collect()
    }

    pub fn to_token_sequence(&self, text: &str, max_len: usize) -> TokenSequence {
        pad_sequence(self.text_to_ids(text), max_len)
    }
}

/// Keep the last `max_len` ids, left-padding shorter input with [`PADDING_ID`].
pub fn pad_sequence(ids: Vec<u32>, max_len: usize) -> TokenSequence {
    let ids = if ids.len() >= max_len {
        ids[ids.len() - max_len..].to_vec()
    } else {
        let mut padded = vec![PADDING_ID; max_len - ids.len()];
        padded.extend(ids);
        padded
    };
    TokenSequence { ids }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> SequenceTokenizer {
        let word_index = [("click", 1u32), ("here", 2), ("to", 3), ("verify", 4), ("rare", 7)]
            .into_iter()
            .map(|(w, i)| (w.to_string(), i))
            .collect();
        SequenceTokenizer {
            word_index,
            num_words: Some(5),
            filters: default_filters(),
            split: default_split(),
            lower: true,
            oov_token: None,
        }
    }

    #[test]
    fn filters_punctuation_and_lowercases() {
        let t = tokenizer();
        assert_eq!(t.text_to_ids("Click HERE, to verify!"), vec![1, 2, 3, 4]);
    }

    #[test]
    fn drops_unknown_and_out_of_range_words() {
        let t = tokenizer();
        assert_eq!(t.text_to_ids("click rare unknown here"), vec![1, 2]);
    }

    #[test]
    fn oov_token_replaces_dropped_words() {
        let mut t = tokenizer();
        t.word_index.insert("<oov>".into(), 1);
        t.word_index.insert("click".into(), 6);
        t.oov_token = Some("<oov>".into());
        assert_eq!(t.text_to_ids("click nope here"), vec![1, 1, 2]);
    }

    #[test]
    fn short_input_is_left_padded() {
        let seq = tokenizer().to_token_sequence("verify here", 5);
        assert_eq!(seq.ids, vec![0, 0, 0, 4, 2]);
    }

    #[test]
    fn long_input_keeps_tail() {
        let seq = pad_sequence(vec![1, 2, 3, 4, 1, 2], 4);
        assert_eq!(seq.ids, vec![3, 4, 1, 2]);
    }

    #[test]
    fn empty_input_is_all_padding() {
        let seq = tokenizer().to_token_sequence("", 100);
        assert_eq!(seq.len(), 100);
        assert!(seq.is_all_padding());
    }

    #[test]
    fn vocab_size_prefers_num_words() {
        let mut t = tokenizer();
        assert_eq!(t.vocab_size(), 5);
        t.num_words = None;
        assert_eq!(t.vocab_size(), 8);
    }

    #[test]
    fn only_the_separator_splits_words() {
        let t = tokenizer();
        assert_eq!(t.text_to_ids("click\r\nverify here"), vec![4, 2]);
        assert_eq!(t.text_to_ids("click\u{a0}here  to"), vec![3]);
        assert_eq!(t.text_to_ids("click\there"), vec![1, 2]);
    }

    #[test]
    fn vocab_size_covers_oov_id_past_num_words() {
        let mut t = tokenizer();
        t.word_index.insert("<oov>".into(), 9);
        t.oov_token = Some("<oov>".into());
        assert_eq!(t.vocab_size(), 10);
        assert_eq!(t.text_to_ids("click nope"), vec![1, 9]);
        assert!(t.text_to_ids("click nope").iter().all(|&id| (id as usize) < t.vocab_size()));
    }

    #[test]
    fn padding_id_cannot_be_a_word() {
        let mut t = tokenizer();
        t.word_index.insert("zero".into(), 0);
        assert!(t.validate().is_err());
    }
}
