use std::sync::Arc;

use chrono::Local;
use tracing::{info, warn};

use super::audit::{AuditEntry, AuditOutcome, SubmissionLog};
use super::domain::{LeadValidationError, NormalizedLead, RawLead};
use super::sink::{LeadSink, SinkError};

/// Message returned to the browser when delivery fails; the cause stays in the logs.
pub const DELIVERY_FAILED_MESSAGE: &str = "Unable to submit your request right now";

/// Service composing payload validation, the audit log, and sink delivery.
pub struct LeadRelayService<S> {
    sink: Arc<S>,
    log: Arc<SubmissionLog>,
}

impl<S> LeadRelayService<S>
where
    S: LeadSink + 'static,
{
    pub fn new(sink: Arc<S>, log: Arc<SubmissionLog>) -> Self {
        Self { sink, log }
    }

    /// Validate, normalize, record, and forward one request body.
    pub async fn relay(&self, body: &[u8]) -> Result<NormalizedLead, LeadRelayError> {
        let raw = RawLead::from_slice(body);

        let record = match NormalizedLead::from_raw(&raw, Local::now()) {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "lead rejected");
                self.record(
                    AuditEntry::new(AuditOutcome::Rejected, &raw).with_error(err.to_string()),
                )
                .await;
                return Err(err.into());
            }
        };

        match self.sink.deliver(&record).await {
            Ok(receipt) => {
                info!(loan_type = %record.loan_type, status = receipt.status, "lead relayed");
                self.record(
                    AuditEntry::new(AuditOutcome::Relayed, &raw)
                        .with_normalized(&record)
                        .with_sink_status(receipt.status),
                )
                .await;
                Ok(record)
            }
            Err(err) => {
                warn!(error = %err, "lead delivery failed");
                self.record(
                    AuditEntry::new(AuditOutcome::DeliveryFailed, &raw)
                        .with_normalized(&record)
                        .with_error(err.to_string()),
                )
                .await;
                Err(err.into())
            }
        }
    }

    // A broken log must not cost us the lead.
    async fn record(&self, entry: AuditEntry) {
        if let Err(err) = self.log.append(&entry).await {
            warn!(error = %err, path = %self.log.path().display(), "submission log write failed");
        }
    }
}

/// Error raised by the relay service.
#[derive(Debug, thiserror::Error)]
pub enum LeadRelayError {
    #[error(transparent)]
    Validation(#[from] LeadValidationError),
    #[error(transparent)]
    Delivery(#[from] SinkError),
}

impl LeadRelayError {
    /// Text safe to show the submitter.
    pub fn public_message(&self) -> String {
        match self {
            LeadRelayError::Validation(err) => err.to_string(),
            LeadRelayError::Delivery(_) => DELIVERY_FAILED_MESSAGE.to_string(),
        }
    }
}
