//! Input validation module

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use validator::Validate;

/// Longest identifier the student API hands out
const MAX_ID_LEN: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("Field '{field}' is too long (max {max} characters)")]
    TooLong { field: String, max: usize },

    #[error("Invalid identifier for '{field}'")]
    InvalidId { field: String },

    #[error("Preferred date must be in the future")]
    DateInPast,

    #[error("Invalid input: {0}")]
    Invalid(String),
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<&str> = errors.field_errors().keys().copied().collect();
        fields.sort_unstable();
        ValidationError::Invalid(fields.join(", "))
    }
}

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RequestCallInput {
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
    pub preferred_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmBatchInput {
    #[validate(length(min = 1, max = 64))]
    pub batch_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RevokeMentorInput {
    #[serde(default)]
    pub confirm: bool,
}

// =============================================================================
// Checks
// =============================================================================

/// Validate an identifier taken from a path or body
pub fn validate_id(field: &str, id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LEN,
        });
    }

    // Upstream ids are UUIDs or hex object ids
    let is_valid = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !is_valid {
        return Err(ValidationError::InvalidId {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validate a call request against the current time
pub fn validate_request_call(
    input: &RequestCallInput,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    input.validate()?;
    if let Some(date) = input.preferred_date {
        if date <= now {
            return Err(ValidationError::DateInPast);
        }
    }
    Ok(())
}

pub fn validate_confirm_batch(input: &ConfirmBatchInput) -> Result<(), ValidationError> {
    input.validate()?;
    validate_id("batchId", &input.batch_id)
}
