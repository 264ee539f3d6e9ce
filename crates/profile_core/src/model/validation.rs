//! Field-level validation for inbound profile data.
//!
//! # Responsibility
//! - Collect every field failure of one payload instead of stopping at the first.
//! - Provide the shared text/date/url checks used by all entity validators.
//!
//! # Invariants
//! - Blank optional values (`""` or whitespace) count as "not set".
//! - Dates are `YYYY-MM` or `YYYY-MM-DD`; ordering compares the common prefix.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-(0[1-9]|1[0-2])(-(0[1-9]|[12]\d|3[01]))?$").expect("valid date regex")
});
static HTTP_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://\S+$").expect("valid url regex"));

/// Implemented by every inbound payload that must be checked before storage.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// One rejected field with a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Ordered list of field failures for one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a single-field failure.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Returns whether `field` has at least one failure.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }

    /// Converts the collected failures into a validation result.
    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "validation failed: {joined}")
    }
}

impl Error for ValidationErrors {}

/// Returns the trimmed value when it carries any non-whitespace text.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

pub fn require_text(errors: &mut ValidationErrors, field: &str, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(field, format!("{label} is required"));
    }
}

pub fn require_min_chars(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    value: &str,
    min_chars: usize,
) {
    if value.trim().chars().count() < min_chars {
        errors.push(
            field,
            format!("{label} must be at least {min_chars} characters"),
        );
    }
}

pub fn check_email(errors: &mut ValidationErrors, field: &str, value: &str) {
    if !EMAIL_RE.is_match(value.trim()) {
        errors.push(field, "Please enter a valid email");
    }
}

pub fn check_date(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    if let Some(date) = present(value) {
        if !DATE_RE.is_match(date) {
            errors.push(field, "Date must use YYYY-MM or YYYY-MM-DD format");
        }
    }
}

pub fn check_http_url(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    if let Some(url) = present(value) {
        if !HTTP_URL_RE.is_match(url) {
            errors.push(field, "URL must start with http:// or https://");
        }
    }
}

pub fn check_range(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<i64>,
    min: i64,
    max: i64,
) {
    if let Some(number) = value {
        if number < min || number > max {
            errors.push(field, format!("Must be between {min} and {max}"));
        }
    }
}

/// Rejects an end date that precedes its start date.
///
/// Only well-formed dates are compared; format errors are reported by
/// [`check_date`].
pub fn check_period(errors: &mut ValidationErrors, start: Option<&str>, end: Option<&str>) {
    let (Some(start), Some(end)) = (present(start), present(end)) else {
        return;
    };
    if !DATE_RE.is_match(start) || !DATE_RE.is_match(end) {
        return;
    }
    let common = start.len().min(end.len());
    if end[..common] < start[..common] {
        errors.push("endDate", "End date cannot be before start date");
    }
}
