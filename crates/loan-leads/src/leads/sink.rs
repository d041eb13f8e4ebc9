use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, Client, StatusCode, Url};
use tracing::{debug, warn};

use super::domain::NormalizedLead;
use crate::config::SinkConfig;
use crate::error::AppError;

const MAX_REDIRECTS: usize = 10;
const LOGGED_BODY_LIMIT: usize = 512;

/// Result of a delivery the sink accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkReceipt {
    pub status: u16,
}

/// Delivery failure. The messages are for operators; callers must not echo
/// them to end users.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("sink unreachable after {attempts} attempt(s): {message}")]
    Transport { attempts: u32, message: String },
    #[error("sink answered with status {status} after {attempts} attempt(s)")]
    Rejected { status: u16, attempts: u32 },
    #[error("sink client could not be built: {0}")]
    Client(String),
}

/// Durable destination for normalized leads.
#[async_trait]
pub trait LeadSink: Send + Sync {
    async fn deliver(&self, record: &NormalizedLead) -> Result<SinkReceipt, SinkError>;
}

/// Spreadsheet append script reached over HTTPS with a form-encoded POST.
#[derive(Debug, Clone)]
pub struct SpreadsheetSink {
    client: Client,
    endpoint: Url,
    max_retries: u32,
    retry_backoff: Duration,
}

impl SpreadsheetSink {
    pub fn new(
        endpoint: Url,
        timeout: Duration,
        max_retries: u32,
        retry_backoff: Duration,
    ) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|err| SinkError::Client(err.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            max_retries,
            retry_backoff,
        })
    }

    pub fn from_config(config: &SinkConfig) -> Result<Self, AppError> {
        let endpoint = config.endpoint()?.clone();
        let sink = Self::new(
            endpoint,
            config.timeout,
            config.max_retries,
            config.retry_backoff,
        )?;
        Ok(sink)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn attempt(&self, record: &NormalizedLead) -> Result<StatusCode, reqwest::Error> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .form(record)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!(
            status = status.as_u16(),
            body = %truncate(&body, LOGGED_BODY_LIMIT),
            "sink response"
        );
        Ok(status)
    }
}

#[async_trait]
impl LeadSink for SpreadsheetSink {
    async fn deliver(&self, record: &NormalizedLead) -> Result<SinkReceipt, SinkError> {
        let total_attempts = self.max_retries.saturating_add(1);
        let mut attempt = 1;

        loop {
            let retryable = match self.attempt(record).await {
                Ok(status) if status.is_success() => {
                    return Ok(SinkReceipt {
                        status: status.as_u16(),
                    })
                }
                Ok(status) if status.is_server_error() && attempt < total_attempts => {
                    format!("status {status}")
                }
                Ok(status) => {
                    return Err(SinkError::Rejected {
                        status: status.as_u16(),
                        attempts: attempt,
                    })
                }
                Err(err) if attempt < total_attempts => err.to_string(),
                Err(err) => {
                    return Err(SinkError::Transport {
                        attempts: attempt,
                        message: err.to_string(),
                    })
                }
            };

            warn!(attempt, total_attempts, reason = %retryable, "sink delivery failed, retrying");
            tokio::time::sleep(backoff_delay(self.retry_backoff, attempt)).await;
            attempt += 1;
        }
    }
}

/// Linear backoff, saturating instead of overflowing on large settings.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.checked_mul(attempt).unwrap_or(Duration::MAX)
}

fn truncate(value: &str, limit: usize) -> &str {
    match value.char_indices().nth(limit) {
        Some((index, _)) => &value[..index],
        None => value,
    }
}
