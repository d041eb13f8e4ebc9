use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::domain::{NormalizedLead, RawLead, SUBMISSION_DATE_FORMAT};

/// Outcome recorded for one request, with everything an operator needs to
/// reconcile the sheet against what the browser sent.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub outcome: AuditOutcome,
    pub received: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<NormalizedLead>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Relayed,
    Rejected,
    DeliveryFailed,
}

impl AuditOutcome {
    pub fn label(self) -> &'static str {
        match self {
            AuditOutcome::Relayed => "Relayed",
            AuditOutcome::Rejected => "Rejected",
            AuditOutcome::DeliveryFailed => "Delivery Failed",
        }
    }
}

impl AuditEntry {
    pub fn new(outcome: AuditOutcome, received: &RawLead) -> Self {
        Self {
            outcome,
            received: Value::Object(received.as_map().clone()),
            normalized: None,
            sink_status: None,
            error: None,
        }
    }

    pub fn with_normalized(mut self, record: &NormalizedLead) -> Self {
        self.normalized = Some(record.clone());
        self
    }

    pub fn with_sink_status(mut self, status: u16) -> Self {
        self.sink_status = Some(status);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// `<timestamp> - <label> <json>` followed by a newline.
    pub fn render_line(&self) -> String {
        let dump = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        format!(
            "{} - {} {}\n",
            Local::now().format(SUBMISSION_DATE_FORMAT),
            self.outcome.label(),
            dump
        )
    }
}

/// Append-only text log of submissions. Writers inside the process queue on
/// the mutex so lines never interleave.
#[derive(Debug)]
pub struct SubmissionLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SubmissionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, entry: &AuditEntry) -> std::io::Result<()> {
        let line = entry.render_line();
        let _guard = self.write_lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw() -> RawLead {
        RawLead::from_slice(br#"{"loan_type":"Refinance","name":"A"}"#)
    }

    #[test]
    fn renders_timestamped_single_line() {
        let entry = AuditEntry::new(AuditOutcome::Rejected, &raw())
            .with_error("Missing required field: email");
        let line = entry.render_line();

        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        let (timestamp, rest) = line.split_once(" - ").expect("separator present");
        assert_eq!(timestamp.len(), "2026-01-01 00:00:00".len());
        assert!(rest.starts_with("Rejected {"));

        let dump: Value =
            serde_json::from_str(rest.trim_start_matches("Rejected ").trim()).expect("json dump");
        assert_eq!(dump["received"]["loan_type"], json!("Refinance"));
        assert_eq!(dump["error"], json!("Missing required field: email"));
        assert!(dump.get("normalized").is_none());
    }

    #[tokio::test]
    async fn appends_without_truncating() {
        let dir = tempfile::tempdir().expect("temp dir");
        let log = SubmissionLog::new(dir.path().join("form_submissions.log"));

        let first = AuditEntry::new(AuditOutcome::Rejected, &RawLead::from_slice(b"garbage"))
            .with_error("Missing required field: loan_type");
        let second = AuditEntry::new(AuditOutcome::Relayed, &raw()).with_sink_status(200);
        log.append(&first).await.expect("first write");
        log.append(&second).await.expect("second write");

        let contents = std::fs::read_to_string(log.path()).expect("log readable");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"received\":{}"));
        assert!(lines[1].contains("\"sink_status\":200"));
    }
}
