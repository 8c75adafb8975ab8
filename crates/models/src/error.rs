use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name -> messages, the body of a 400 response.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorShape {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(flatten)]
    pub fields: FieldErrors,
}

#[derive(Error, Debug)]
pub enum AirportError {
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("Malformed request: {reason}")]
    Malformed { reason: String },

    #[error("Invalid page.")]
    InvalidPage,

    #[error("Unsupported media type \"{media_type}\" in request.")]
    UnsupportedMediaType { media_type: String },

    #[error("Authentication credentials were not provided.")]
    NotAuthenticated,

    #[error("Given token not valid for any token type: {reason}")]
    InvalidToken { reason: String },

    #[error("No active account found with the given credentials")]
    InvalidCredentials,

    #[error("You do not have permission to perform this action.")]
    PermissionDenied,

    #[error("Database unavailable after {attempts} attempts: {reason}")]
    DatabaseUnavailable { attempts: u32, reason: String },

    #[error("Database error: {reason}")]
    DatabaseError { reason: String },

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("Internal server error: {reason}")]
    InternalError { reason: String },
}

impl AirportError {
    /// A validation error carrying a single message for a single field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.into()]);
        AirportError::Validation(errors)
    }

    pub fn to_error_shape(&self) -> ErrorShape {
        match self {
            AirportError::Validation(fields) => ErrorShape {
                detail: None,
                fields: fields.clone(),
            },
            AirportError::NotFound { .. } => ErrorShape {
                detail: Some("Not found.".to_string()),
                fields: FieldErrors::new(),
            },
            AirportError::Malformed { reason } => ErrorShape {
                detail: Some(format!("JSON parse error - {reason}")),
                fields: FieldErrors::new(),
            },
            AirportError::InvalidToken { .. } => ErrorShape {
                detail: Some("Given token not valid for any token type".to_string()),
                fields: FieldErrors::new(),
            },
            // 5xx bodies are generic; the cause goes to the log.
            e if e.http_status() >= 500 => ErrorShape {
                detail: Some("A server error occurred.".to_string()),
                fields: FieldErrors::new(),
            },
            e => ErrorShape {
                detail: Some(e.to_string()),
                fields: FieldErrors::new(),
            },
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            AirportError::NotFound { .. } => "not_found",
            AirportError::Validation(_) => "invalid",
            AirportError::Malformed { .. } => "parse_error",
            AirportError::InvalidPage => "not_found",
            AirportError::UnsupportedMediaType { .. } => "unsupported_media_type",
            AirportError::NotAuthenticated => "not_authenticated",
            AirportError::InvalidToken { .. } => "token_not_valid",
            AirportError::InvalidCredentials => "no_active_account",
            AirportError::PermissionDenied => "permission_denied",
            AirportError::DatabaseUnavailable { .. } => "service_unavailable",
            AirportError::DatabaseError { .. } => "error",
            AirportError::SqlxError(_) => "error",
            AirportError::Io(_) => "error",
            AirportError::ConfigError { .. } => "error",
            AirportError::InternalError { .. } => "error",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            AirportError::NotFound { .. } => 404,
            AirportError::Validation(_) => 400,
            AirportError::Malformed { .. } => 400,
            AirportError::InvalidPage => 404,
            AirportError::UnsupportedMediaType { .. } => 415,
            AirportError::NotAuthenticated => 401,
            AirportError::InvalidToken { .. } => 401,
            AirportError::InvalidCredentials => 401,
            AirportError::PermissionDenied => 403,
            AirportError::DatabaseUnavailable { .. } => 503,
            AirportError::DatabaseError { .. } => 500,
            AirportError::SqlxError(_) => 500,
            AirportError::Io(_) => 500,
            AirportError::ConfigError { .. } => 500,
            AirportError::InternalError { .. } => 500,
        }
    }
}
