use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier assigned to a submission at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One visitor question and its eventual answer.
///
/// `is_answered`, `answer`, and `answered_at` are either all absent/false
/// (pending) or all present/true (answered); the repository adapters are the
/// only writers and maintain that invariant. Client-facing JSON uses
/// camelCase field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub name: String,
    pub email: String,
    pub question: String,
    pub answer: Option<String>,
    pub is_answered: bool,
    pub created_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
}

/// Raw inbound payload for the submit endpoint. Missing fields deserialize to
/// empty strings and are rejected by `validate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub question: String,
}

/// Validated, trimmed creation payload handed to the storage port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub name: String,
    pub email: String,
    pub question: String,
}

/// A single violated field with a client-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Per-field validation failure for a creation or answer payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: &'static str, message: &str) -> Self {
        Self {
            fields: vec![FieldError {
                field,
                message: message.to_string(),
            }],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid submission: ")?;
        for (index, field) in self.fields.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field.field, field.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Check and normalize a creation request, collecting one message per
/// violated field.
pub fn validate(request: SubmitRequest) -> Result<NewSubmission, ValidationError> {
    let name = request.name.trim();
    let email = request.email.trim();
    let question = request.question.trim();

    let mut fields = Vec::new();

    if name.is_empty() {
        fields.push(FieldError {
            field: "name",
            message: "name must not be empty".to_string(),
        });
    }
    if !is_email_shaped(email) {
        fields.push(FieldError {
            field: "email",
            message: "email must be a valid address".to_string(),
        });
    }
    if question.is_empty() {
        fields.push(FieldError {
            field: "question",
            message: "question must not be empty".to_string(),
        });
    }

    if fields.is_empty() {
        Ok(NewSubmission {
            name: name.to_string(),
            email: email.to_string(),
            question: question.to_string(),
        })
    } else {
        Err(ValidationError { fields })
    }
}

/// Structural address check: one `@`, a non-empty local part, and a dotted
/// domain. Deliverability is the notifier's problem, not validation's.
fn is_email_shaped(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
