//! phishguard entrypoint: loads the models once, scores one input, prints the
//! response payload as a JSON line, and optionally records it in the prediction log.

use clap::{Parser, Subcommand};
use phishguard::{
    config::DetectorConfig,
    dataset::{write_dataset, DatasetLabel},
    detector::PhishingDetector,
    error::DetectorError,
    fusion::{PredictionResponse, Verdict},
    input::RawInput,
    logging::StructuredLogger,
    mail::MailMessage,
    storage::PredictionStore,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{error, info};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file (falls back to PHISHGUARD_CONFIG_PATH, then config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// User the prediction log entries belong to
    #[arg(long, global = true, default_value_t = 0)]
    user_id: i64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score pasted email text (reads stdin when TEXT is omitted)
    Text { text: Option<String> },
    /// Score a URL
    Url { url: String },
    /// Score a fetched Gmail API message (format=full JSON)
    Mail { message: PathBuf },
    /// Show recent prediction log entries
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Export a JSON array of fetched Gmail messages as a `text,label` training CSV
    Collect {
        messages: PathBuf,
        #[arg(long, short, default_value = "dataset/my_emails.csv")]
        output: PathBuf,
        /// Label the rows phishing (1) instead of legitimate (0)
        #[arg(long)]
        phishing: bool,
    },
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(|| {
        std::env::var("PHISHGUARD_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.json"))
    })
}

fn read_input(command: &Commands) -> Result<RawInput, BoxError> {
    let input = match command {
        Commands::Text { text: Some(t) } => RawInput::text(t)?,
        Commands::Text { text: None } => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            RawInput::from_bytes(&buf)?
        }
        Commands::Url { url } => RawInput::url(url)?,
        Commands::Mail { message } => {
            let json = std::fs::read_to_string(message)?;
            let msg = MailMessage::from_json(&json)?;
            info!(id = %msg.id, sender = %msg.sender(), "scoring mail message");
            msg.to_raw_input()?
        }
        Commands::History { .. } | Commands::Collect { .. } => {
            return Err("command takes no scoring input".into())
        }
    };
    Ok(input)
}

fn open_store(config: &DetectorConfig) -> Result<Option<PredictionStore>, BoxError> {
    if !config.store.enabled {
        return Ok(None);
    }
    let store = PredictionStore::open(
        &config.store.path,
        config.store.secret.as_bytes(),
        config.store.text_limit,
    )?;
    Ok(Some(store))
}

/// A verdict that cannot be recorded fails the command.
fn record_prediction(
    store: Option<&PredictionStore>,
    user_id: i64,
    input: &RawInput,
    verdict: &Verdict,
) -> Result<(), BoxError> {
    if let Some(store) = store {
        if let Err(e) = store.record(user_id, input.log_text(), verdict) {
            error!(error = %e, "failed to record prediction");
            return Err(e);
        }
    }
    Ok(())
}

fn collect(messages: &Path, output: &Path, phishing: bool) -> Result<(), BoxError> {
    let batch = MailMessage::batch_from_json(&std::fs::read_to_string(messages)?)?;
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let label = if phishing {
        DatasetLabel::Phishing
    } else {
        DatasetLabel::Legitimate
    };
    let rows = write_dataset(&batch, label, std::fs::File::create(output)?)?;
    info!(rows, output = %output.display(), "collected messages");
    Ok(())
}

fn run(cli: &Cli, config: &DetectorConfig) -> Result<(), BoxError> {
    if let Commands::Collect {
        messages,
        output,
        phishing,
    } = &cli.command
    {
        return collect(messages, output, *phishing);
    }

    let store = open_store(config)?;
    let mut stdout = std::io::stdout().lock();

    if let Commands::History { limit } = cli.command {
        let Some(store) = store else {
            return Err("prediction log is disabled in config".into());
        };
        for entry in store.recent(cli.user_id, limit)? {
            StructuredLogger::emit_json(&entry, &mut stdout)?;
        }
        return Ok(());
    }

    let input = read_input(&cli.command)?;
    let detector = PhishingDetector::load(&config.models)?;
    let verdict = detector.predict_input(&input)?;

    record_prediction(store.as_ref(), cli.user_id, &input, &verdict)?;

    StructuredLogger::emit_json(&PredictionResponse::from(&verdict), &mut stdout)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let config = DetectorConfig::load(&config_path(&cli));
    StructuredLogger::init(config.log.json, &config.log.level);

    if let Err(e) = run(&cli, &config) {
        let status = e
            .downcast_ref::<DetectorError>()
            .map(DetectorError::status_class)
            .unwrap_or(500);
        let body = serde_json::json!({ "error": e.to_string(), "status": status });
        let _ = StructuredLogger::emit_json(&body, &mut std::io::stdout());
        std::process::exit(if status < 500 { 2 } else { 1 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phishguard::fusion::fuse;

    #[test]
    fn record_failure_fails_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.db");
        let store = PredictionStore::open(&path, b"s", 500).unwrap();
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch("DROP TABLE prediction_logs")
            .unwrap();

        let input = RawInput::text("verify your account").unwrap();
        let verdict = fuse(0.9, 0.9, 0.9);
        assert!(record_prediction(Some(&store), 1, &input, &verdict).is_err());
        assert!(record_prediction(None, 1, &input, &verdict).is_ok());
    }

    #[test]
    fn collect_writes_csv_under_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let messages = dir.path().join("batch.json");
        std::fs::write(
            &messages,
            r#"[{"id": "a", "payload": {"headers": [{"name": "Subject", "value": "Hi"}], "body": {"data": "aGVsbG8"}}}]"#,
        )
        .unwrap();
        let output = dir.path().join("dataset").join("my_emails.csv");

        collect(&messages, &output, false).unwrap();
        let csv = std::fs::read_to_string(&output).unwrap();
        assert_eq!(csv, "text,label\n\"Subject: Hi\n\nhello\",0\n");
    }
}
