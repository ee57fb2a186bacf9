//! Labeled training-data export: fetched messages → `text,label` CSV rows.

use crate::mail::MailMessage;
use std::io::Write;
use tracing::{debug, info};

/// Class label written beside each message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetLabel {
    Legitimate = 0,
    Phishing = 1,
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Write a header row then one row per message, framed the same way the
/// detector sees mail. Any undecodable message aborts the export.
/// Returns the number of rows written.
pub fn write_dataset<W: Write>(messages: &[MailMessage], label: DatasetLabel, out: W) -> Result<usize, BoxError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["text", "label"])?;
    let label = (label as u8).to_string();
    for msg in messages {
        let input = msg.to_raw_input()?;
        writer.write_record([input.as_str(), label.as_str()])?;
        debug!(id = %msg.id, "dataset row written");
    }
    writer.flush()?;
    info!(rows = messages.len(), "dataset exported");
    Ok(messages.len())
}
