//! Client-facing failures and their JSON rendering.
//!
//! # Invariants
//! - Every error body is `{"message": ...}`, plus `errors` for validation.
//! - Internal details are logged, never sent to clients.

use http::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use http::{Response, StatusCode};
use log::error;
use profile_core::{ServiceError, ValidationErrors};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ApiResult<T> = Result<T, ApiError>;

const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
pub enum ApiError {
    Unauthenticated,
    InvalidCredentials,
    Forbidden,
    NotFound(String),
    Validation(ValidationErrors),
    /// Body was not JSON or did not fit the expected shape.
    MalformedBody(String),
    MethodNotAllowed { allow: &'static str },
    PayloadTooLarge,
    Internal(Box<dyn Error + Send + Sync>),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the response body.
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => INTERNAL_MESSAGE.to_string(),
            Self::Validation(_) => "Validation failed".to_string(),
            other => other.to_string(),
        }
    }

    pub fn into_response(self) -> Response<Vec<u8>> {
        if let Self::Internal(err) = &self {
            error!("event=request_failed module=api status=error error={err}");
        }

        #[derive(Serialize)]
        struct ErrorBody<'a> {
            message: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            errors: Option<&'a ValidationErrors>,
        }

        let errors = match &self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        };
        let body = serde_json::to_vec(&ErrorBody {
            message: self.public_message(),
            errors,
        })
        .unwrap_or_else(|_| format!(r#"{{"message":"{INTERNAL_MESSAGE}"}}"#).into_bytes());

        let mut response = Response::new(body);
        *response.status_mut() = self.status();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Self::MethodNotAllowed { allow } = &self {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static(*allow));
        }
        response
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "Not authenticated"),
            Self::InvalidCredentials => write!(f, "Invalid username or password"),
            Self::Forbidden => write!(f, "Forbidden"),
            Self::NotFound(message) => write!(f, "{message}"),
            Self::Validation(errors) => write!(f, "{errors}"),
            Self::MalformedBody(message) => write!(f, "Malformed request body: {message}"),
            Self::MethodNotAllowed { .. } => write!(f, "Method not allowed"),
            Self::PayloadTooLarge => write!(f, "Request body too large"),
            Self::Internal(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::Internal(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Validation(errors) => Self::Validation(errors),
            ServiceError::NotFound(label) => Self::NotFound(format!("{label} not found")),
            ServiceError::Forbidden => Self::Forbidden,
            ServiceError::InvalidCredentials => Self::InvalidCredentials,
            other @ (ServiceError::Password(_) | ServiceError::Repo(_)) => {
                Self::Internal(Box::new(other))
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(Box::new(value))
    }
}
