//! Use-case services for accounts and owned records.
//!
//! # Responsibility
//! - Validate input, enforce ownership and translate absence into errors.
//! - Keep transport layers decoupled from storage details.
//!
//! # Invariants
//! - Every read-by-id or mutation of an owned record goes through
//!   [`ownership::authorize`].
//! - Services never return password hashes to callers that render JSON;
//!   renderers use [`crate::model::user::User::redacted`].

use crate::auth::PasswordError;
use crate::model::validation::ValidationErrors;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod ownership;
pub mod profile_service;
pub mod record_service;

pub use profile_service::ProfileService;
pub use record_service::RecordService;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Use-case failure, mapped one-to-one onto client-visible outcomes.
#[derive(Debug)]
pub enum ServiceError {
    /// Input failed field-level checks.
    Validation(ValidationErrors),
    /// The named kind of record does not exist.
    NotFound(&'static str),
    /// The record exists but belongs to someone else.
    Forbidden,
    /// Unknown username or wrong password.
    InvalidCredentials,
    Password(PasswordError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "{errors}"),
            Self::NotFound(label) => write!(f, "{label} not found"),
            Self::Forbidden => write!(f, "Forbidden"),
            Self::InvalidCredentials => write!(f, "Invalid username or password"),
            Self::Password(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::Password(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) | Self::Forbidden | Self::InvalidCredentials => None,
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<PasswordError> for ServiceError {
    fn from(value: PasswordError) -> Self {
        Self::Password(value)
    }
}

/// Unique-key clashes surface as field errors, like any other bad input.
impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Conflict { fields } => {
                let mut errors = ValidationErrors::new();
                for field in fields {
                    let message = format!("{} already exists", capitalize(&field));
                    errors.push(&field, message);
                }
                Self::Validation(errors)
            }
            other => Self::Repo(other),
        }
    }
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::ServiceError;
    use crate::repo::RepoError;

    #[test]
    fn conflicts_become_field_errors() {
        let err = ServiceError::from(RepoError::Conflict {
            fields: vec!["username".to_string(), "email".to_string()],
        });
        let errors = match err {
            ServiceError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other}"),
        };
        let messages: Vec<&str> = errors
            .errors()
            .iter()
            .map(|error| error.message.as_str())
            .collect();
        assert_eq!(messages, ["Username already exists", "Email already exists"]);
    }
}
