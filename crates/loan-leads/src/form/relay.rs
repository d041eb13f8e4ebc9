use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use super::fields::{
    loan_form, validate_page, FieldDescriptor, FormValues, Page, ValidationReport,
};
use super::navigator::{PageNavigator, PageTransition, ScrollAnchor};
use super::notifications::{NotificationCenter, NotificationKind};

pub const LOADING_MESSAGE: &str = "Processing your loan request...";
pub const SUCCESS_MESSAGE: &str =
    "Your loan request has been submitted successfully! We'll contact you soon with the best rates.";
pub const FAILURE_MESSAGE: &str = "There was an error submitting your form. Please try again.";

/// Body the intake endpoint answers with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unreadable response: {0}")]
    Decode(String),
}

/// Carries a serialized form to the intake endpoint.
#[async_trait]
pub trait LeadTransport: Send + Sync {
    async fn post_lead(&self, payload: &FormValues) -> Result<SubmitResponse, TransportError>;
}

/// JSON POST to the relay endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpLeadTransport {
    client: Client,
    endpoint: Url,
}

impl HttpLeadTransport {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::Request(err.to_string()))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl LeadTransport for HttpLeadTransport {
    async fn post_lead(&self, payload: &FormValues) -> Result<SubmitResponse, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;

        let status = response.status();
        let body = response
            .json::<SubmitResponse>()
            .await
            .map_err(|err| TransportError::Decode(format!("status {status}: {err}")))?;
        Ok(body)
    }
}

/// State of one two-page enquiry form: values, visible page, and error marks.
#[derive(Debug, Clone)]
pub struct LeadForm {
    fields: &'static [FieldDescriptor],
    values: FormValues,
    navigator: PageNavigator,
    marked: BTreeSet<&'static str>,
}

impl Default for LeadForm {
    fn default() -> Self {
        Self::new(loan_form())
    }
}

impl LeadForm {
    pub fn new(fields: &'static [FieldDescriptor]) -> Self {
        Self {
            fields,
            values: FormValues::new(),
            navigator: PageNavigator::default(),
            marked: BTreeSet::new(),
        }
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.values.insert(field.to_string(), value.into());
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn page(&self) -> Page {
        self.navigator.current()
    }

    pub fn heading(&self) -> &'static str {
        self.navigator.heading()
    }

    pub fn is_marked(&self, field: &str) -> bool {
        self.marked.contains(field)
    }

    /// Validate the required fields of the visible page.
    pub fn validate_current(&self) -> ValidationReport {
        validate_page(self.fields, self.page(), &self.values)
    }

    /// Mark failing fields and raise one error notification per issue; clear
    /// marks on fields that now pass. Returns whether the report was clean.
    pub fn apply(&mut self, report: &ValidationReport, notifications: &mut NotificationCenter) -> bool {
        for field in report.passed() {
            self.marked.remove(field);
        }
        for issue in &report.issues {
            self.marked.insert(issue.field);
            notifications.notify(issue.message.clone(), NotificationKind::Error);
        }
        report.is_valid()
    }

    /// Request the contact page. The swap still has to be completed after the
    /// transition delay with [`LeadForm::complete`].
    pub fn next_page(
        &mut self,
        anchor: ScrollAnchor,
        notifications: &mut NotificationCenter,
    ) -> Option<PageTransition> {
        match self.navigator.next(self.fields, &self.values, anchor) {
            Ok(transition) => {
                let fields = self.fields;
                self.marked.retain(|id| {
                    !fields
                        .iter()
                        .any(|field| field.id == *id && field.page == Page::Details)
                });
                Some(transition)
            }
            Err(report) => {
                self.apply(&report, notifications);
                None
            }
        }
    }

    pub fn previous_page(&self, anchor: ScrollAnchor) -> PageTransition {
        self.navigator.previous(anchor)
    }

    pub fn complete(&mut self, transition: PageTransition) {
        self.navigator.complete(transition);
    }

    /// Flat key/value view of every non-empty value entered so far.
    pub fn payload(&self) -> FormValues {
        self.values
            .iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn reset(&mut self) {
        self.values.clear();
        self.marked.clear();
        self.navigator.reset();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent.
    Invalid(ValidationReport),
    /// Another submission from this client is still waiting on the network.
    Busy,
    Submitted,
    Failed,
}

/// Drives validation, the single in-flight request, and user feedback.
pub struct LeadFormClient<T> {
    transport: T,
    notifications: Arc<Mutex<NotificationCenter>>,
    in_flight: AtomicBool,
}

impl<T> LeadFormClient<T>
where
    T: LeadTransport,
{
    pub fn new(transport: T, notifications: Arc<Mutex<NotificationCenter>>) -> Self {
        Self {
            transport,
            notifications,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn notifications(&self) -> MutexGuard<'_, NotificationCenter> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn submit(&self, form: &mut LeadForm) -> SubmitOutcome {
        let report = form.validate_current();
        if !form.apply(&report, &mut self.notifications()) {
            return SubmitOutcome::Invalid(report);
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!("submission already in flight");
            return SubmitOutcome::Busy;
        };

        let loading = self
            .notifications()
            .show(LOADING_MESSAGE, NotificationKind::Loading, None);
        let payload = form.payload();
        debug!(?payload, "sending form data");

        let result = self.transport.post_lead(&payload).await;

        let mut notifications = self.notifications();
        notifications.hide(loading);
        match result {
            Ok(response) if response.success => {
                debug!("server accepted submission");
                form.reset();
                notifications.notify(SUCCESS_MESSAGE, NotificationKind::Success);
                SubmitOutcome::Submitted
            }
            Ok(response) => {
                debug!(error = ?response.error, "server rejected submission");
                notifications.notify(FAILURE_MESSAGE, NotificationKind::Error);
                SubmitOutcome::Failed
            }
            Err(err) => {
                debug!(error = %err, "submission error");
                notifications.notify(FAILURE_MESSAGE, NotificationKind::Error);
                SubmitOutcome::Failed
            }
        }
    }
}

struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
