use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::CorsConfig;
use crate::leads::audit::SubmissionLog;
use crate::leads::domain::NormalizedLead;
use crate::leads::router::{cors_layer, lead_router};
use crate::leads::service::LeadRelayService;
use crate::leads::sink::{LeadSink, SinkError, SinkReceipt};

pub(super) const ALLOWED_ORIGIN: &str = "https://guide.example.sg";

#[derive(Default)]
pub(super) struct RecordingSink {
    delivered: Mutex<Vec<NormalizedLead>>,
}

impl RecordingSink {
    pub(super) fn delivered(&self) -> Vec<NormalizedLead> {
        self.delivered.lock().expect("sink mutex poisoned").clone()
    }
}

#[async_trait]
impl LeadSink for RecordingSink {
    async fn deliver(&self, record: &NormalizedLead) -> Result<SinkReceipt, SinkError> {
        self.delivered
            .lock()
            .expect("sink mutex poisoned")
            .push(record.clone());
        Ok(SinkReceipt { status: 200 })
    }
}

pub(super) struct UnreachableSink;

#[async_trait]
impl LeadSink for UnreachableSink {
    async fn deliver(&self, _record: &NormalizedLead) -> Result<SinkReceipt, SinkError> {
        Err(SinkError::Transport {
            attempts: 3,
            message: "error sending request: connection refused".to_string(),
        })
    }
}

pub(super) struct Harness<S> {
    pub(super) service: Arc<LeadRelayService<S>>,
    pub(super) sink: Arc<S>,
    pub(super) log_path: PathBuf,
    _dir: TempDir,
}

pub(super) fn harness<S>(sink: S) -> Harness<S>
where
    S: LeadSink + 'static,
{
    let dir = tempfile::tempdir().expect("temp dir");
    let log_path = dir.path().join("form_submissions.log");
    let sink = Arc::new(sink);
    let service = Arc::new(LeadRelayService::new(
        sink.clone(),
        Arc::new(SubmissionLog::new(log_path.clone())),
    ));

    Harness {
        service,
        sink,
        log_path,
        _dir: dir,
    }
}

impl<S> Harness<S>
where
    S: LeadSink + 'static,
{
    pub(super) fn router(&self) -> axum::Router {
        let cors = cors_layer(&CorsConfig {
            allowed_origin: ALLOWED_ORIGIN.to_string(),
        })
        .expect("valid origin");
        lead_router(self.service.clone(), cors)
    }

    pub(super) fn log_lines(&self) -> Vec<String> {
        std::fs::read_to_string(&self.log_path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

pub(super) fn full_payload() -> Value {
    json!({
        "loan_type": "New Purchase",
        "property_type": "Condominium",
        "property_purchase": "Completed",
        "loan_amount": "850000",
        "rate_type": "Floating",
        "name": "Siti Rahman",
        "email": "siti@example.sg",
        "contact": "+65 8123 4567"
    })
}

pub(super) fn body_of(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).expect("json encodes")
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
