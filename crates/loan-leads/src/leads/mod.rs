//! Server side of the lead pipeline: decode the browser payload, check the
//! required fields, stamp it, keep an audit line, and hand it to the sink.

pub mod audit;
pub mod domain;
pub mod router;
pub mod service;
pub mod sink;

#[cfg(test)]
mod tests;

pub use audit::{AuditEntry, AuditOutcome, SubmissionLog};
pub use domain::{LeadValidationError, NormalizedLead, RawLead, REQUIRED_FIELDS};
pub use router::{cors_layer, lead_router, LEADS_PATH};
pub use service::{LeadRelayError, LeadRelayService, DELIVERY_FAILED_MESSAGE};
pub use sink::{LeadSink, SinkError, SinkReceipt, SpreadsheetSink};
