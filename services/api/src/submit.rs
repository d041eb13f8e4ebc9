use clap::Args;
use loan_leads::error::AppError;
use loan_leads::form::{
    loan_form, rate_banner, validate_field, HttpLeadTransport, LeadForm, LeadFormClient, NotificationCenter,
    NotificationKind, ScrollAnchor, SubmitOutcome,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use url::Url;

#[derive(Args, Debug)]
pub(crate) struct SubmitArgs {
    /// Lead intake endpoint of a running service
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub(crate) endpoint: Url,
    /// Loan type (e.g. "New Purchase", "Refinance")
    #[arg(long)]
    pub(crate) loan_type: String,
    /// Property type (e.g. "HDB", "Condominium")
    #[arg(long)]
    pub(crate) property_type: Option<String>,
    /// Purchase status of the property (e.g. "Completed")
    #[arg(long)]
    pub(crate) property_purchase: Option<String>,
    /// Requested loan amount
    #[arg(long)]
    pub(crate) loan_amount: String,
    /// Preferred rate type (e.g. "Fixed", "Floating")
    #[arg(long)]
    pub(crate) rate_type: Option<String>,
    /// Applicant name
    #[arg(long)]
    pub(crate) name: String,
    /// Applicant email address
    #[arg(long)]
    pub(crate) email: String,
    /// Applicant contact number
    #[arg(long)]
    pub(crate) contact: String,
    /// Seconds to wait for the service to answer
    #[arg(long, default_value_t = 15)]
    pub(crate) timeout_secs: u64,
}

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/api/v1/leads";

impl SubmitArgs {
    /// Optional choices are not checked by the page gate, so an unknown one is
    /// refused here instead of being sent along.
    fn fill_details(&self, form: &mut LeadForm) -> Result<(), AppError> {
        form.set("loan_type", self.loan_type.as_str());
        form.set("loan_amount", self.loan_amount.as_str());
        for (id, value) in [
            ("property_type", &self.property_type),
            ("property_purchase", &self.property_purchase),
            ("rate_type", &self.rate_type),
        ] {
            let Some(value) = value else { continue };
            if let Some(field) = loan_form().iter().find(|field| field.id == id) {
                validate_field(field, Some(value.as_str()))
                    .map_err(|issue| AppError::Usage(issue.message))?;
            }
            form.set(id, value.as_str());
        }
        Ok(())
    }

    fn fill_contact(&self, form: &mut LeadForm) {
        form.set("name", self.name.as_str());
        form.set("email", self.email.as_str());
        form.set("contact", self.contact.as_str());
    }
}

fn center(notifications: &Mutex<NotificationCenter>) -> MutexGuard<'_, NotificationCenter> {
    notifications.lock().unwrap_or_else(PoisonError::into_inner)
}

fn render_notifications(notifications: &Mutex<NotificationCenter>) {
    for notification in center(notifications).live() {
        let tag = match notification.kind {
            NotificationKind::Success => "ok",
            NotificationKind::Error => "error",
            NotificationKind::Loading => "...",
        };
        println!("  [{tag}] {}", notification.message);
    }
}

pub(crate) async fn run_submit(args: SubmitArgs) -> Result<(), AppError> {
    let notifications = Arc::new(Mutex::new(NotificationCenter::new()));
    let mut form = LeadForm::default();

    println!("{}", rate_banner(chrono::Local::now().date_naive()));
    println!("{}", form.heading());
    args.fill_details(&mut form)?;

    let transition = form.next_page(ScrollAnchor::default(), &mut center(&notifications));
    let Some(transition) = transition else {
        render_notifications(&notifications);
        return Err(AppError::Usage(
            "enquiry details failed validation".to_string(),
        ));
    };
    tokio::time::sleep(transition.swap_after).await;
    form.complete(transition);

    println!("{}", form.heading());
    args.fill_contact(&mut form);

    let transport =
        HttpLeadTransport::new(args.endpoint.clone(), Duration::from_secs(args.timeout_secs))?;
    let client = LeadFormClient::new(transport, notifications.clone());
    let outcome = client.submit(&mut form).await;
    render_notifications(&notifications);

    match outcome {
        SubmitOutcome::Submitted => Ok(()),
        SubmitOutcome::Invalid(_) => Err(AppError::Usage(
            "contact details failed validation".to_string(),
        )),
        SubmitOutcome::Busy | SubmitOutcome::Failed => Err(AppError::Usage(format!(
            "submission to {} failed",
            args.endpoint
        ))),
    }
}
