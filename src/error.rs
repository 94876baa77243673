//! Plugin error types with HTTP status code mapping.
//!
//! [`OracleError`] is the central error type for the crate. Registration
//! failures surface synchronously from [`crate::registry::OracleRegistry::register`];
//! request-time failures (extractor rejections, query errors) render as
//! structured JSON error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2003,
///     "message": "connection name \"users\" has already been registered",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Central error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                |
/// |-----------|-------------------|----------------------------|
/// | 1000–1999 | Validation        | 400 Bad Request            |
/// | 2000–2999 | Registration      | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server / Driver   | 500 Internal Server Error  |
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// No pool source was supplied in the configuration.
    #[error("must supply pool settings, an existing pool, or a pool alias")]
    MissingPoolSource,

    /// Pool settings failed validation before any driver call.
    #[error("invalid pool settings: {0}")]
    InvalidPoolSettings(String),

    /// Unrecognized out-format string.
    #[error("invalid out format \"{0}\": expected \"object\" or \"array\"")]
    InvalidOutFormat(String),

    /// Unrecognized fetch-as-string column class.
    #[error("invalid fetch-as-string class \"{0}\": expected \"number\", \"date\" or \"clob\"")]
    InvalidFetchAsString(String),

    /// A bind parameter could not be mapped to an Oracle scalar.
    #[error("invalid bind parameter: {0}")]
    InvalidBind(String),

    /// Alias resolution found no pool registered under that name.
    #[error("could not get pool alias \"{0}\"")]
    UnknownAlias(String),

    /// The default (unnamed) pool was registered twice.
    #[error("the default oracle pool has already been registered")]
    AlreadyRegistered,

    /// A named pool was registered twice under the same name.
    #[error("connection name \"{0}\" has already been registered")]
    DuplicateName(String),

    /// The driver rejected pool creation.
    #[error("failed to create pool: {0}")]
    PoolCreation(#[source] oracle::Error),

    /// Request-time lookup found no pool registered under that name.
    #[error("no oracle pool registered under name \"{0}\"")]
    PoolNotFound(String),

    /// The registry extension is missing from the router.
    #[error("oracle plugin has not been attached to this router")]
    NotAttached,

    /// Error propagated from the Oracle driver.
    #[error("oracle driver error: {0}")]
    Driver(#[from] oracle::Error),

    /// Internal failure (blocking task panicked or was cancelled).
    #[error("internal error: {0}")]
    Internal(String),
}

impl OracleError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::MissingPoolSource => 1001,
            Self::InvalidPoolSettings(_) => 1002,
            Self::InvalidOutFormat(_) => 1003,
            Self::InvalidFetchAsString(_) => 1004,
            Self::InvalidBind(_) => 1005,
            Self::UnknownAlias(_) => 2001,
            Self::AlreadyRegistered => 2002,
            Self::DuplicateName(_) => 2003,
            Self::PoolCreation(_) => 3001,
            Self::Driver(_) => 3002,
            Self::NotAttached => 3003,
            Self::PoolNotFound(_) => 3004,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingPoolSource
            | Self::InvalidPoolSettings(_)
            | Self::InvalidOutFormat(_)
            | Self::InvalidFetchAsString(_)
            | Self::InvalidBind(_) => StatusCode::BAD_REQUEST,
            Self::UnknownAlias(_) => StatusCode::NOT_FOUND,
            Self::AlreadyRegistered | Self::DuplicateName(_) => StatusCode::CONFLICT,
            Self::PoolCreation(_)
            | Self::Driver(_)
            | Self::NotAttached
            | Self::PoolNotFound(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for OracleError {
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
