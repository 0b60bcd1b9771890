//! Gateway error types with HTTP status code mapping.
//!
//! [`RelayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Validation failures are ordinary return values, never panics; the
//! process must survive every variant.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "channel or token not valid for listener",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`RelayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                      |
/// |-----------|-------------------|----------------------------------|
/// | 1000–1999 | Access validation | 401 Unauthorized / 403 Forbidden |
/// | 2000–2999 | Bad input         | 400 Bad Request                  |
/// | 3000–3999 | Stores / server   | 500 / 503                        |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// No listener credential matches the supplied channel and token.
    ///
    /// Deliberately covers both "unknown channel" and "wrong token" so the
    /// response never reveals which channels exist.
    #[error("channel or token not valid for listener")]
    InvalidListener,

    /// No sender credential matches the supplied channel and token.
    #[error("channel or token not valid for sender")]
    UnknownSenderCredential,

    /// A sender credential matched but its IP allowlist rejects the caller.
    #[error("ip {ip} not authorized for this sender")]
    IpNotAuthorized {
        /// Source IP that was rejected.
        ip: String,
    },

    /// The credential store could not be read.
    #[error("credential store unavailable: {0}")]
    CredentialStoreUnavailable(String),

    /// The event log store could not be read or written.
    #[error("log store unavailable: {0}")]
    LogStoreUnavailable(String),

    /// Unknown credential source selector in a reload request.
    #[error("invalid credential source: {0}")]
    InvalidSource(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidListener => 1001,
            Self::UnknownSenderCredential => 1002,
            Self::IpNotAuthorized { .. } => 1003,
            Self::InvalidSource(_) => 2001,
            Self::CredentialStoreUnavailable(_) => 3001,
            Self::LogStoreUnavailable(_) => 3002,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidListener | Self::UnknownSenderCredential => StatusCode::UNAUTHORIZED,
            Self::IpNotAuthorized { .. } => StatusCode::FORBIDDEN,
            Self::InvalidSource(_) => StatusCode::BAD_REQUEST,
            Self::CredentialStoreUnavailable(_) | Self::LogStoreUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a short machine-readable kind string used in audit entries.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidListener => "invalid_listener",
            Self::UnknownSenderCredential => "unknown_sender_credential",
            Self::IpNotAuthorized { .. } => "ip_not_authorized",
            Self::CredentialStoreUnavailable(_) => "credential_store_unavailable",
            Self::LogStoreUnavailable(_) => "log_store_unavailable",
            Self::InvalidSource(_) => "invalid_source",
            Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
