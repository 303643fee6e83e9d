//! Boundary validation for service input.
//!
//! Mirrors the schema checks the API applies before data reaches a store.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

/// Prefix of ids minted for records that only exist in the Local Mirror.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid `{}`: {}", self.field, self.message)
    }
}

impl Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn non_empty(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

pub fn uuid(field: &'static str, value: &str) -> ValidationResult {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new(field, format!("`{value}` is not a UUID")))
}

/// Accepts remote UUIDs and local-only ids.
pub fn record_id(field: &'static str, value: &str) -> ValidationResult {
    if value.starts_with(LOCAL_ID_PREFIX) && value.len() > LOCAL_ID_PREFIX.len() {
        return Ok(());
    }
    uuid(field, value)
}

pub fn timestamp(field: &'static str, value: &str) -> ValidationResult {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new(field, format!("`{value}` is not an RFC 3339 timestamp")))
}

pub fn email(field: &'static str, value: &str) -> ValidationResult {
    if !EMAIL_RE.is_match(value) {
        return Err(ValidationError::new(field, format!("`{value}` is not an email")));
    }
    Ok(())
}

pub fn story_points(field: &'static str, value: f64) -> ValidationResult {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::new(field, "must be a non-negative number"));
    }
    Ok(())
}
