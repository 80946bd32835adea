//! Contact (CRM) model.

use serde::{Deserialize, Serialize};

/// Where a contact record came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ContactSource {
    #[default]
    Manual,
    Import,
}

impl ContactSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactSource::Manual => "manual",
            ContactSource::Import => "import",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(ContactSource::Manual),
            "import" => Some(ContactSource::Import),
            _ => None,
        }
    }
}

/// A person or organization the club keeps in touch with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub source: ContactSource,
    pub created_at: String,
    pub updated_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

impl Contact {
    /// "First Last", trimmed, falling back to whichever half exists.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Whether the contact carries enough of an address for physical mail.
    pub fn has_postal_address(&self) -> bool {
        [&self.street, &self.postal_code, &self.city]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
    }
}

/// Request body for creating a new contact. Also the shape of an imported record.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateContactRequest {
    /// Check the fields every contact needs.
    pub fn validate(&self) -> Result<(), String> {
        if self.first_name.trim().is_empty() && self.last_name.trim().is_empty() {
            return Err("First name or last name is required".to_string());
        }
        if let Some(email) = self.email.as_deref() {
            if !email.trim().is_empty() && !is_plausible_email(email) {
                return Err(format!("Invalid email address: {}", email));
            }
        }
        Ok(())
    }
}

/// Request body for updating an existing contact.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContactRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body for a contact import run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportContactsRequest {
    pub contacts: Vec<CreateContactRequest>,
    /// When false the import is only previewed.
    #[serde(default)]
    pub commit: bool,
}

/// Why a contact looks like a duplicate.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MatchReason {
    SameEmail,
    SamePhone,
    SameName,
    NameContained,
    SimilarName,
}

/// A possible duplicate of a candidate record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateMatch {
    /// Existing contact ID, or `None` when the match is an earlier record of the same import.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_index: Option<usize>,
    pub display_name: String,
    pub score: f64,
    pub reasons: Vec<MatchReason>,
}

/// Outcome for a single record of an import run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum ImportOutcome {
    Created {
        index: usize,
        contact: Contact,
    },
    #[serde(rename_all = "camelCase")]
    Duplicate {
        index: usize,
        record: CreateContactRequest,
        best_match: DuplicateMatch,
    },
    Skipped {
        index: usize,
        reason: String,
    },
}

/// Summary of an import run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub committed: bool,
    pub total: usize,
    pub created: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub outcomes: Vec<ImportOutcome>,
}

/// Lenient email check: something on both sides of a single `@`, and a dot in the domain.
pub fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}
