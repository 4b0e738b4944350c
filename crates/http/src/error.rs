//! Response envelope and error mapping for the HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use books_kernel::settings::StatusPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

/// Error half of the envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub trace_id: String,
    #[serde(default)]
    pub timestamp: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        Self {
            code: code.into(),
            message: message.into(),
            trace_id: Uuid::now_v7().to_string(),
            timestamp,
        }
    }
}

/// Uniform wrapper returned by every operation.
///
/// Serializes as `{"result": ...}` or `{"error": {...}}`, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Envelope<T> {
    Result(T),
    Error(ErrorBody),
}

impl<T> Envelope<T> {
    pub fn into_result(self) -> Result<T, ErrorBody> {
        match self {
            Envelope::Result(value) => Ok(value),
            Envelope::Error(body) => Err(body),
        }
    }
}

/// Result payload of operations that return no record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub message: String,
}

impl OperationOutcome {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Application errors; `Timeout` and `Internal` are raised by the server itself
/// rather than by an operation and carry fixed codes
#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {message}")]
    NotFound { code: String, message: String },

    #[error("persistence error: {message}")]
    Persistence {
        code: String,
        message: String,
        conflict: bool,
    },

    #[error("bad request: {message}")]
    BadRequest { code: String, message: String },

    #[error("request timed out")]
    Timeout,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a not found error
    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence {
            code: code.into(),
            message: message.into(),
            conflict: false,
        }
    }

    /// Create a persistence error caused by a uniqueness or constraint violation
    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence {
            code: code.into(),
            message: message.into(),
            conflict: true,
        }
    }

    /// Create a bad request error
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Client-facing error code
    pub fn code(&self) -> &str {
        match self {
            AppError::NotFound { code, .. }
            | AppError::Persistence { code, .. }
            | AppError::BadRequest { code, .. } => code,
            AppError::Timeout => "request_timeout",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Status used when coded errors map onto HTTP semantics
    pub fn strict_status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Persistence { conflict: true, .. } => StatusCode::CONFLICT,
            AppError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Status for this error under the given policy; server faults ignore the policy
    pub fn status(&self, policy: StatusPolicy) -> StatusCode {
        match (policy, self) {
            (_, AppError::Timeout | AppError::Internal(_)) => self.strict_status(),
            (StatusPolicy::Compat, _) => StatusCode::OK,
            (StatusPolicy::Strict, _) => self.strict_status(),
        }
    }

    /// Convert into the error half of the envelope
    pub fn into_body(self) -> ErrorBody {
        let code = self.code().to_string();
        let message = match self {
            AppError::NotFound { message, .. }
            | AppError::Persistence { message, .. }
            | AppError::BadRequest { message, .. } => message,
            AppError::Timeout => "Request timed out".to_string(),
            // In production, hide internal error details
            AppError::Internal(_) if cfg!(not(debug_assertions)) => {
                "An internal server error occurred".to_string()
            }
            AppError::Internal(e) => e.to_string(),
        };
        ErrorBody::new(code, message)
    }

    /// Render the error envelope with the status chosen by `policy`
    pub fn into_response_with(self, policy: StatusPolicy) -> Response {
        let status = self.status(policy);
        let body = self.into_body();

        tracing::error!(
            trace_id = %body.trace_id,
            error_code = %body.code,
            status_code = %status.as_u16(),
            message = %body.message,
            "request error"
        );

        (status, Json(Envelope::<()>::Error(body))).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_with(StatusPolicy::Strict)
    }
}

/// Render an operation result as an envelope response
pub fn reply<T: Serialize>(policy: StatusPolicy, outcome: Result<T, AppError>) -> Response {
    match outcome {
        Ok(value) => (StatusCode::OK, Json(Envelope::Result(value))).into_response(),
        Err(err) => err.into_response_with(policy),
    }
}
