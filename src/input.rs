//! Caller-side input framing and validation before text reaches the detector.

use crate::error::{DetectorError, Result};

/// Text ready for scoring, plus the form it should be recorded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInput {
    text: String,
    log_text: String,
}

fn require_text(s: &str, what: &str) -> Result<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(DetectorError::InvalidInput(format!("{} is required", what)));
    }
    Ok(trimmed.to_string())
}

impl RawInput {
    /// Pasted email text.
    pub fn text(s: &str) -> Result<Self> {
        let text = require_text(s, "Email text")?;
        Ok(Self {
            log_text: text.clone(),
            text,
        })
    }

    /// A URL, framed to look like email content.
    pub fn url(s: &str) -> Result<Self> {
        let url = require_text(s, "URL")?;
        Ok(Self {
            text: format!("Subject: URL Link Body: {}", url),
            log_text: format!("URL: {}", url),
        })
    }

    /// Subject and body of a fetched message. An empty subject is allowed.
    pub fn email(subject: &str, body: &str) -> Self {
        let text = format!("Subject: {}\n\n{}", subject, body);
        Self {
            log_text: text.clone(),
            text,
        }
    }

    /// Text from raw bytes; rejects anything that is not UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| DetectorError::InvalidInput(format!("input is not UTF-8 text: {}", e)))?;
        Self::text(s)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// What a prediction log should record for this input.
    pub fn log_text(&self) -> &str {
        &self.log_text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_rejected() {
        let err = RawInput::text("  \n\t ").unwrap_err();
        assert_eq!(err.status_class(), 400);
        assert!(RawInput::url("").is_err());
    }

    #[test]
    fn text_is_trimmed() {
        assert_eq!(RawInput::text("  hello there \n").unwrap().as_str(), "hello there");
    }

    #[test]
    fn url_gets_email_framing() {
        let input = RawInput::url(" http://paypa1.example/login ").unwrap();
        assert_eq!(input.as_str(), "Subject: URL Link Body: http://paypa1.example/login");
        assert_eq!(input.log_text(), "URL: http://paypa1.example/login");
    }

    #[test]
    fn email_joins_subject_and_body() {
        let input = RawInput::email("Invoice", "Please pay");
        assert_eq!(input.as_str(), "Subject: Invoice\n\nPlease pay");
    }

    #[test]
    fn non_utf8_bytes_rejected() {
        let err = RawInput::from_bytes(&[0x66, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, DetectorError::InvalidInput(_)));
        assert_eq!(RawInput::from_bytes(b"ok").unwrap().as_str(), "ok");
    }
}
