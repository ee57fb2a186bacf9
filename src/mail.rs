//! Decoding of already-fetched Gmail API messages (`format=full`) into scorable text.
//! Fetching and credentials live with the caller.

use crate::error::{DetectorError, Result};
use crate::input::RawInput;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// URL-safe alphabet, padding optional.
const BODY_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub snippet: String,
    pub payload: MessagePart,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: PartBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<MessagePart>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

fn decode_body(data: &str) -> Result<String> {
    let bytes = BODY_BASE64
        .decode(data.trim())
        .map_err(|e| DetectorError::InvalidInput(format!("message body is not base64: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| DetectorError::InvalidInput(format!("message body is not UTF-8: {}", e)))
}

impl MailMessage {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DetectorError::InvalidInput(format!("malformed message: {}", e)))
    }

    fn header(&self, name: &str) -> &str {
        self.payload
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
            .unwrap_or("")
    }

    pub fn subject(&self) -> &str {
        self.header("Subject")
    }

    pub fn sender(&self) -> &str {
        self.header("From")
    }

    /// First top-level `text/plain` part, or the single-part body, or empty.
    pub fn plain_body(&self) -> Result<String> {
        match &self.payload.parts {
            Some(parts) => match parts.iter().find(|p| p.mime_type == "text/plain") {
                Some(part) => decode_body(part.body.data.as_deref().unwrap_or("")),
                None => Ok(String::new()),
            },
            None => match self.payload.body.data.as_deref() {
                Some(data) => decode_body(data),
                None => Ok(String::new()),
            },
        }
    }

    /// A JSON array of `format=full` messages.
    pub fn batch_from_json(json: &str) -> Result<Vec<Self>> {
        serde_json::from_str(json)
            .map_err(|e| DetectorError::InvalidInput(format!("malformed message batch: {}", e)))
    }

    pub fn to_raw_input(&self) -> Result<RawInput> {
        Ok(RawInput::email(self.subject(), &self.plain_body()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(s: &str) -> String {
        base64::engine::general_purpose::URL_SAFE.encode(s)
    }

    fn multipart() -> String {
        serde_json::json!({
            "id": "18c2",
            "snippet": "Your account...",
            "payload": {
                "mimeType": "multipart/alternative",
                "headers": [
                    {"name": "From", "value": "Security <alerts@examp1e.com>"},
                    {"name": "Subject", "value": "Action required"}
                ],
                "body": {"size": 0},
                "parts": [
                    {"mimeType": "text/html", "body": {"data": encode("<b>html</b>")}},
                    {"mimeType": "text/plain", "body": {"data": encode("Verify your account now?")}}
                ]
            }
        })
        .to_string()
    }

    #[test]
    fn picks_plain_text_part() {
        let msg = MailMessage::from_json(&multipart()).unwrap();
        assert_eq!(msg.subject(), "Action required");
        assert_eq!(msg.sender(), "Security <alerts@examp1e.com>");
        assert_eq!(msg.plain_body().unwrap(), "Verify your account now?");
        assert_eq!(
            msg.to_raw_input().unwrap().as_str(),
            "Subject: Action required\n\nVerify your account now?"
        );
    }

    #[test]
    fn single_part_body_without_padding() {
        let data = encode("hi").trim_end_matches('=').to_string();
        let json = serde_json::json!({
            "id": "1",
            "payload": {"mimeType": "text/plain", "headers": [], "body": {"data": data}}
        });
        let msg = MailMessage::from_json(&json.to_string()).unwrap();
        assert_eq!(msg.subject(), "");
        assert_eq!(msg.plain_body().unwrap(), "hi");
    }

    #[test]
    fn multipart_without_plain_text_has_empty_body() {
        let json = serde_json::json!({
            "payload": {"parts": [{"mimeType": "text/html", "body": {"data": encode("x")}}]}
        });
        let msg = MailMessage::from_json(&json.to_string()).unwrap();
        assert_eq!(msg.plain_body().unwrap(), "");
    }

    #[test]
    fn batch_decodes_array_and_rejects_object() {
        let batch = format!("[{}, {}]", multipart(), multipart());
        assert_eq!(MailMessage::batch_from_json(&batch).unwrap().len(), 2);
        assert!(MailMessage::batch_from_json(&multipart()).is_err());
    }

    #[test]
    fn corrupt_body_is_invalid_input() {
        let json = serde_json::json!({"payload": {"body": {"data": "%%%"}}});
        let msg = MailMessage::from_json(&json.to_string()).unwrap();
        assert!(matches!(msg.plain_body(), Err(DetectorError::InvalidInput(_))));
    }
}
