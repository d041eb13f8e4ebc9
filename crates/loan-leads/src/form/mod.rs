//! Browser-side behavior of the enquiry form, free of any DOM: field rules,
//! page flow, notifications, and the submission client.

pub mod fields;
pub mod navigator;
pub mod notifications;
pub mod relay;
pub mod widgets;

pub use fields::{
    loan_form, validate, validate_field, validate_page, FieldDescriptor, FieldIssue, FieldKind,
    FormValues, Page, ValidationReport,
};
pub use navigator::{PageNavigator, PageTransition, ScrollAnchor, PAGE_SWAP_DELAY};
pub use notifications::{Notification, NotificationCenter, NotificationId, NotificationKind};
pub use relay::{
    HttpLeadTransport, LeadForm, LeadFormClient, LeadTransport, SubmitOutcome, SubmitResponse,
    TransportError,
};
pub use widgets::{rate_banner, FaqAccordion, PartnerCarousel};
