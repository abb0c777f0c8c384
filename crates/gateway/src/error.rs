//! Error types for the request pipeline.
//!
//! Every pipeline stage only throws typed errors; mapping from error type to
//! HTTP status and response body happens in exactly one place, the
//! [`IntoResponse`] implementation below. No other module formats an error
//! response.
//!
//! # Error Mapping
//!
//! | Error | HTTP Status | Code |
//! |-------|-------------|------|
//! | Unauthorized | 401 | UNAUTHORIZED |
//! | Forbidden | 403 | FORBIDDEN |
//! | Validation | 400 | VALIDATION_ERROR |
//! | InvalidJson | 400 | INVALID_JSON |
//! | MissingFile | 400 | MISSING_FILE |
//! | FileTooLarge | 400 | FILE_TOO_LARGE |
//! | InvalidFileType | 400 | INVALID_FILE_TYPE |
//! | NotFound | 404 | NOT_FOUND |
//! | Configuration | 500 | CONFIGURATION_ERROR |
//! | Internal | 500 | INTERNAL_ERROR |
//!
//! Configuration and internal errors never leak their details to the
//! caller; the message in the response body is generic and the real cause
//! goes to the log.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use atelier_core::auth::AuthError;
use atelier_core::directory::DirectoryError;
use atelier_core::resource::ResourceError;
use atelier_core::schema::Violation;

/// The primary error type for pipeline operations.
#[derive(Debug)]
pub enum GatewayError {
    /// Authentication failed or is missing (HTTP 401).
    Unauthorized {
        /// Error message.
        message: String,
    },

    /// Authenticated but not allowed (HTTP 403).
    Forbidden {
        /// Error message.
        message: String,
    },

    /// Declared input violated its schema (HTTP 400).
    Validation {
        /// Summary message.
        message: String,
        /// Every violated field across all declared parts.
        details: Vec<Violation>,
    },

    /// The request body was not parseable as JSON (HTTP 400).
    ///
    /// Distinguished from [`GatewayError::Validation`]: raised before schema
    /// validation runs.
    InvalidJson {
        /// Parse error description.
        message: String,
    },

    /// A required multipart file field was absent (HTTP 400).
    MissingFile {
        /// The declared field name.
        field: String,
    },

    /// A multipart file exceeded its size limit (HTTP 400).
    FileTooLarge {
        /// The declared field name.
        field: String,
        /// The configured limit in bytes.
        limit_bytes: usize,
    },

    /// A multipart file had a MIME type outside the allowlist (HTTP 400).
    InvalidFileType {
        /// The declared field name.
        field: String,
        /// The rejected MIME type.
        mime_type: String,
    },

    /// A domain entity was not found (HTTP 404).
    ///
    /// Raised by handlers; passes through the central mapping unchanged.
    NotFound {
        /// The entity kind (e.g. "content").
        resource: String,
        /// The entity identifier.
        id: String,
    },

    /// Required configuration is missing or invalid (HTTP 500).
    Configuration {
        /// Description, logged but not sent to the caller.
        message: String,
    },

    /// Unexpected failure (HTTP 500). Details are never sent to the caller.
    Internal {
        /// Description, logged but not sent to the caller.
        message: String,
    },
}

impl GatewayError {
    /// Convenience constructor for a single-message validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        GatewayError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Returns the stable error code used in response envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Unauthorized { .. } => "UNAUTHORIZED",
            GatewayError::Forbidden { .. } => "FORBIDDEN",
            GatewayError::Validation { .. } => "VALIDATION_ERROR",
            GatewayError::InvalidJson { .. } => "INVALID_JSON",
            GatewayError::MissingFile { .. } => "MISSING_FILE",
            GatewayError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            GatewayError::InvalidFileType { .. } => "INVALID_FILE_TYPE",
            GatewayError::NotFound { .. } => "NOT_FOUND",
            GatewayError::Configuration { .. } => "CONFIGURATION_ERROR",
            GatewayError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            GatewayError::Forbidden { .. } => StatusCode::FORBIDDEN,
            GatewayError::Validation { .. }
            | GatewayError::InvalidJson { .. }
            | GatewayError::MissingFile { .. }
            | GatewayError::FileTooLarge { .. }
            | GatewayError::InvalidFileType { .. } => StatusCode::BAD_REQUEST,
            GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::Configuration { .. } | GatewayError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Unauthorized { message } => write!(f, "unauthorized: {}", message),
            GatewayError::Forbidden { message } => write!(f, "forbidden: {}", message),
            GatewayError::Validation { message, details } => {
                write!(f, "validation failed: {} ({} violations)", message, details.len())
            }
            GatewayError::InvalidJson { message } => write!(f, "invalid JSON body: {}", message),
            GatewayError::MissingFile { field } => write!(f, "missing file field: {}", field),
            GatewayError::FileTooLarge { field, limit_bytes } => {
                write!(f, "file '{}' exceeds {} bytes", field, limit_bytes)
            }
            GatewayError::InvalidFileType { field, mime_type } => {
                write!(f, "file '{}' has disallowed type {}", field, mime_type)
            }
            GatewayError::NotFound { resource, id } => {
                write!(f, "{} not found: {}", resource, id)
            }
            GatewayError::Configuration { message } => {
                write!(f, "configuration error: {}", message)
            }
            GatewayError::Internal { message } => write!(f, "internal error: {}", message),
        }
    }
}

impl std::error::Error for GatewayError {}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, details) = match &self {
            GatewayError::Unauthorized { message } | GatewayError::Forbidden { message } => {
                (message.clone(), None)
            }
            GatewayError::Validation { message, details } => {
                (message.clone(), Some(details.clone()))
            }
            GatewayError::InvalidJson { message } => {
                (format!("Invalid JSON body: {}", message), None)
            }
            GatewayError::MissingFile { field } => {
                (format!("Required file field '{}' is missing", field), None)
            }
            GatewayError::FileTooLarge { field, limit_bytes } => (
                format!("File field '{}' exceeds the limit of {} bytes", field, limit_bytes),
                None,
            ),
            GatewayError::InvalidFileType { field, mime_type } => (
                format!("File field '{}' has disallowed type '{}'", field, mime_type),
                None,
            ),
            GatewayError::NotFound { resource, id } => {
                (format!("{} '{}' not found", resource, id), None)
            }
            // Never leak internals to the caller.
            GatewayError::Configuration { .. } => {
                ("The server is misconfigured".to_string(), None)
            }
            GatewayError::Internal { .. } => ("An unexpected error occurred".to_string(), None),
        };

        let body = error_body(code, &message, details.as_deref());
        (status, Json(body)).into_response()
    }
}

/// Builds the error envelope body.
///
/// `details` entries are `{ "path": ..., "message": ... }` pairs covering
/// every violated field.
pub fn error_body(code: &str, message: &str, details: Option<&[Violation]>) -> serde_json::Value {
    let mut error = serde_json::json!({
        "code": code,
        "message": message,
    });
    if let Some(details) = details {
        if !details.is_empty() {
            error["details"] = serde_json::json!(details);
        }
    }
    serde_json::json!({ "error": error })
}

// Collaborator failures are transport-level problems, not caller mistakes.

impl From<AuthError> for GatewayError {
    fn from(err: AuthError) -> Self {
        GatewayError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<DirectoryError> for GatewayError {
    fn from(err: DirectoryError) -> Self {
        GatewayError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<ResourceError> for GatewayError {
    fn from(err: ResourceError) -> Self {
        GatewayError::Internal {
            message: err.to_string(),
        }
    }
}

/// Result type alias for pipeline operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
