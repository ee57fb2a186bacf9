//! SQLite-backed prediction log with AES-GCM encryption of the originating text.
//! Key derived from a deployment secret.

use crate::fusion::Verdict;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use rand::RngCore;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn derive_key(seed: &[u8]) -> [u8; KEY_LEN] {
    use ring::digest;
    let mut out = [0u8; KEY_LEN];
    let h = digest::digest(&digest::SHA256, seed);
    out[..h.as_ref().len().min(KEY_LEN)].copy_from_slice(h.as_ref());
    out
}

fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<String, aes_gcm::Error> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| aes_gcm::Error)?;
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let ciphertext = cipher.encrypt((&nonce).into(), plaintext)?;
    let mut out = nonce.to_vec();
    out.extend(ciphertext);
    Ok(BASE64.encode(&out))
}

fn decrypt(key: &[u8; KEY_LEN], encoded: &str) -> Result<Vec<u8>, BoxError> {
    let raw = BASE64.decode(encoded)?;
    if raw.len() < NONCE_LEN {
        return Err("payload too short".into());
    }
    let (nonce, ct) = raw.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| format!("{:?}", e))?;
    cipher
        .decrypt(nonce.into(), ct)
        .map_err(|_| "text column failed authentication".into())
}

/// First `limit` characters of `text`.
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// One recorded prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionLogEntry {
    pub id: String,
    pub user_id: i64,
    pub email_text: String,
    pub prediction: String,
    pub confidence: f64,
    pub model_stage: String,
    pub created_at: DateTime<Utc>,
}

pub struct PredictionStore {
    conn: Mutex<Connection>,
    key: [u8; KEY_LEN],
    text_limit: usize,
}

impl PredictionStore {
    /// Open or create DB at path. Key is derived from `secret`.
    pub fn open(path: &Path, secret: &[u8], text_limit: usize) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS prediction_logs (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                email_text_enc TEXT NOT NULL,
                prediction TEXT NOT NULL,
                confidence REAL NOT NULL,
                model_stage TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_logs_user_ts ON prediction_logs(user_id, created_at);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            key: derive_key(secret),
            text_limit,
        })
    }

    /// Record a verdict for `user_id`; the text is truncated then stored encrypted.
    pub fn record(&self, user_id: i64, text: &str, verdict: &Verdict) -> Result<PredictionLogEntry, BoxError> {
        let entry = PredictionLogEntry {
            id: Uuid::new_v4().to_string(),
            user_id,
            email_text: truncate_chars(text, self.text_limit).to_string(),
            prediction: verdict.label.as_str().to_string(),
            confidence: verdict.confidence,
            model_stage: verdict.attributed_model.display_name().to_string(),
            created_at: Utc::now(),
        };
        let enc = encrypt(&self.key, entry.email_text.as_bytes()).map_err(|_| "text encryption failed")?;
        self.conn.lock().map_err(|_| "store lock poisoned")?.execute(
            "INSERT INTO prediction_logs (id, user_id, email_text_enc, prediction, confidence, model_stage, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.id,
                entry.user_id,
                enc,
                entry.prediction,
                entry.confidence,
                entry.model_stage,
                entry.created_at.timestamp_millis()
            ],
        )?;
        Ok(entry)
    }

    /// Newest entries for `user_id`, at most `limit`.
    pub fn recent(&self, user_id: i64, limit: usize) -> Result<Vec<PredictionLogEntry>, BoxError> {
        let conn = self.conn.lock().map_err(|_| "store lock poisoned")?;
        let mut stmt = conn.prepare(
            "SELECT id, email_text_enc, prediction, confidence, model_stage, created_at \
             FROM prediction_logs WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
        )?;
        let mut rows = stmt.query(params![user_id, limit as i64])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let enc: String = row.get(1)?;
            let ts: i64 = row.get(5)?;
            let plain = decrypt(&self.key, &enc)?;
            out.push(PredictionLogEntry {
                id: row.get(0)?,
                user_id,
                email_text: String::from_utf8(plain)?,
                prediction: row.get(2)?,
                confidence: row.get(3)?,
                model_stage: row.get(4)?,
                created_at: Utc
                    .timestamp_millis_opt(ts)
                    .single()
                    .ok_or("created_at out of range")?,
            });
        }
        Ok(out)
    }

    /// Retention: delete entries created before `ts`
    pub fn prune_before(&self, ts: DateTime<Utc>) -> Result<u64, BoxError> {
        let n = self
            .conn
            .lock()
            .map_err(|_| "store lock poisoned")?
            .execute(
                "DELETE FROM prediction_logs WHERE created_at < ?1",
                params![ts.timestamp_millis()],
            )?;
        Ok(n as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn ciphertext_round_trips_and_rejects_wrong_key() {
        let key = derive_key(b"secret");
        let enc = encrypt(&key, b"Verify your account").unwrap();
        assert_ne!(enc, "Verify your account");
        assert_eq!(decrypt(&key, &enc).unwrap(), b"Verify your account");
        assert!(decrypt(&derive_key(b"other"), &enc).is_err());
    }

    #[test]
    fn record_stores_ciphertext_and_reads_back_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let store = PredictionStore::open(&dir.path().join("p.db"), b"secret", 5).unwrap();
        let verdict = crate::fusion::fuse(0.9, 0.8, 0.7);
        let entry = store.record(3, "Verify now", &verdict).unwrap();
        assert_eq!(entry.email_text, "Verif");

        let raw: String = store
            .conn
            .lock()
            .unwrap()
            .query_row("SELECT email_text_enc FROM prediction_logs", [], |r| r.get(0))
            .unwrap();
        assert!(!raw.contains("Verif"));
        let back = store.recent(3, 10).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].id, entry.id);
        assert_eq!(back[0].email_text, "Verif");
        assert_eq!(back[0].prediction, "Phishing");
    }
}
