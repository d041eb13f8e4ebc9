use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields the relay refuses to forward without, checked in this order.
pub const REQUIRED_FIELDS: [&str; 4] = ["loan_type", "name", "email", "contact"];

/// Wire format of the server-assigned submission timestamp.
pub const SUBMISSION_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors raised while turning a request body into a lead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeadValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// The JSON object exactly as the browser posted it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawLead(Map<String, Value>);

impl RawLead {
    /// Decode a request body. Anything that is not a JSON object reads as an
    /// empty lead, so it fails the required-field check like any other gap.
    pub fn from_slice(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Self(map),
            _ => Self(Map::new()),
        }
    }

    /// Textual value of a field; `null`, missing, and blank values read as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        let text = match self.0.get(key)? {
            Value::Null => return None,
            Value::String(value) => value.clone(),
            Value::Bool(value) => value.to_string(),
            Value::Number(value) => value.to_string(),
            other => other.to_string(),
        };

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Whether a field counts as filled in: `false`, zero, `"0"`, empty
    /// collections and blank text do not.
    pub fn is_filled(&self, key: &str) -> bool {
        match self.0.get(key) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::Number(number)) => number.as_f64().is_some_and(|value| value != 0.0),
            Some(Value::String(text)) => {
                let text = text.trim();
                !text.is_empty() && text != "0"
            }
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(fields)) => !fields.is_empty(),
            Some(Value::Bool(true)) => true,
        }
    }

    pub fn first_missing(&self) -> Option<&'static str> {
        REQUIRED_FIELDS
            .into_iter()
            .find(|field| !self.is_filled(field))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for RawLead {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// Record forwarded to the sink: every form field with `""` defaults plus the
/// server timestamp. Field order is the sink's column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedLead {
    pub loan_type: String,
    pub property_type: String,
    pub property_purchase: String,
    pub loan_amount: String,
    pub rate_type: String,
    pub name: String,
    pub email: String,
    pub contact: String,
    pub submission_date: String,
}

impl NormalizedLead {
    pub fn from_raw(raw: &RawLead, received_at: DateTime<Local>) -> Result<Self, LeadValidationError> {
        if let Some(field) = raw.first_missing() {
            return Err(LeadValidationError::MissingField(field));
        }

        let field = |key: &str| raw.text(key).unwrap_or_default();

        Ok(Self {
            loan_type: field("loan_type"),
            property_type: field("property_type"),
            property_purchase: field("property_purchase"),
            loan_amount: field("loan_amount"),
            rate_type: field("rate_type"),
            name: field("name"),
            email: field("email"),
            contact: field("contact"),
            submission_date: received_at.format(SUBMISSION_DATE_FORMAT).to_string(),
        })
    }
}
