use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

/// Which of the two form pages a field lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Details,
    Contact,
}

/// Input kind, deciding which rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Radio,
    Text,
    Email,
    Tel,
    Number,
}

/// Declarative description of one form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub id: &'static str,
    pub kind: FieldKind,
    pub label: &'static str,
    pub required: bool,
    pub page: Page,
    /// Choices offered by radio groups; empty for free-form inputs.
    pub options: &'static [&'static str],
}

impl FieldDescriptor {
    const fn radio(
        id: &'static str,
        label: &'static str,
        required: bool,
        options: &'static [&'static str],
    ) -> Self {
        Self {
            id,
            kind: FieldKind::Radio,
            label,
            required,
            page: Page::Details,
            options,
        }
    }

    const fn input(
        id: &'static str,
        kind: FieldKind,
        label: &'static str,
        page: Page,
    ) -> Self {
        Self {
            id,
            kind,
            label,
            required: true,
            page,
            options: &[],
        }
    }
}

static LOAN_FORM: [FieldDescriptor; 8] = [
    FieldDescriptor::radio(
        "loan_type",
        "Loan Type",
        true,
        &["New Purchase", "Refinance"],
    ),
    FieldDescriptor::radio(
        "property_type",
        "Property Type",
        false,
        &["HDB", "Condominium", "Landed", "Commercial"],
    ),
    FieldDescriptor::radio(
        "property_purchase",
        "Property Purchase",
        false,
        &["Completed", "Under Construction"],
    ),
    FieldDescriptor::input("loan_amount", FieldKind::Number, "Loan Amount", Page::Details),
    FieldDescriptor::radio(
        "rate_type",
        "Rate Type",
        false,
        &["Fixed", "Floating", "No Preference"],
    ),
    FieldDescriptor::input("name", FieldKind::Text, "Name", Page::Contact),
    FieldDescriptor::input("email", FieldKind::Email, "Email", Page::Contact),
    FieldDescriptor::input("contact", FieldKind::Tel, "Contact Number", Page::Contact),
];

/// Field layout of the two-step loan enquiry form.
pub fn loan_form() -> &'static [FieldDescriptor] {
    &LOAN_FORM
}

/// Current input values keyed by field id. Radio groups hold the checked option.
pub type FormValues = BTreeMap<String, String>;

/// A single failed rule, phrased for the person filling the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub message: String,
}

/// Outcome of validating a set of fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub checked: Vec<&'static str>,
    pub issues: Vec<FieldIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issue_for(&self, field: &str) -> Option<&FieldIssue> {
        self.issues.iter().find(|issue| issue.field == field)
    }

    /// Checked fields that passed, i.e. whose error marks should be cleared.
    pub fn passed(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.checked
            .iter()
            .copied()
            .filter(|field| self.issue_for(field).is_none())
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
}

fn contact_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+?[0-9]{8,}$").expect("contact pattern compiles"))
}

pub fn is_valid_email(value: &str) -> bool {
    email_pattern().is_match(value)
}

/// Interior whitespace is ignored, so `+65 9123 4567` passes.
pub fn is_valid_contact(value: &str) -> bool {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    contact_pattern().is_match(&compact)
}

pub fn is_valid_loan_amount(value: &str) -> bool {
    value
        .trim()
        .parse::<f64>()
        .map(|amount| amount.is_finite() && amount > 0.0)
        .unwrap_or(false)
}

/// Apply the rule for one field to its current value.
pub fn validate_field(field: &FieldDescriptor, value: Option<&str>) -> Result<(), FieldIssue> {
    let issue = |message: String| FieldIssue {
        field: field.id,
        message,
    };

    let value = value.map(str::trim).unwrap_or_default();

    if field.kind == FieldKind::Radio {
        let offered = field.options.is_empty() || field.options.contains(&value);
        return if value.is_empty() || !offered {
            Err(issue(format!("Please select an option for {}", field.label)))
        } else {
            Ok(())
        };
    }

    if value.is_empty() {
        return Err(issue(format!("Please fill out {}", field.label)));
    }

    match field.kind {
        FieldKind::Email if !is_valid_email(value) => {
            Err(issue("Please enter a valid email address".to_string()))
        }
        FieldKind::Tel if !is_valid_contact(value) => {
            Err(issue("Please enter a valid contact number".to_string()))
        }
        FieldKind::Number if field.id == "loan_amount" && !is_valid_loan_amount(value) => {
            Err(issue("Please enter a valid loan amount".to_string()))
        }
        _ => Ok(()),
    }
}

/// Validate every required field in `fields`, in order.
pub fn validate<'a, I>(fields: I, values: &FormValues) -> ValidationReport
where
    I: IntoIterator<Item = &'a FieldDescriptor>,
{
    let mut report = ValidationReport::default();

    for field in fields.into_iter().filter(|field| field.required) {
        report.checked.push(field.id);
        if let Err(issue) = validate_field(field, values.get(field.id).map(String::as_str)) {
            report.issues.push(issue);
        }
    }

    report
}

/// Validate the required fields of one page.
pub fn validate_page(fields: &[FieldDescriptor], page: Page, values: &FormValues) -> ValidationReport {
    validate(fields.iter().filter(|field| field.page == page), values)
}
