//! JSON error envelope for the API routes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

/// Errors surfaced by the notification routes.
///
/// Every variant renders as `{ "error": ... }` plus whatever detail the
/// variant carries; none of them is retried.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Required request fields are missing.
    #[error("{0}")]
    Validation(String),

    /// Vendor credentials are not configured.
    #[error("{0}")]
    Config(String),

    /// The vendor answered with a non-2xx status.
    #[error("Failed to send notification")]
    Upstream { status: StatusCode, details: Value },

    /// Anything else: bad JSON, transport failure.
    #[error("{error}")]
    Internal { error: String, details: String },
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(error: impl Into<String>, details: impl ToString) -> Self {
        Self::Internal {
            error: error.into(),
            details: details.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Config(_) | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream { status, .. } => *status,
        }
    }

    /// Response body for this error.
    pub fn body(&self) -> Value {
        match self {
            ApiError::Validation(msg) | ApiError::Config(msg) => json!({ "error": msg }),
            ApiError::Upstream { status, details } => json!({
                "error": self.to_string(),
                "details": details,
                "status": status.as_u16(),
            }),
            ApiError::Internal { error, details } => json!({
                "error": error,
                "details": details,
            }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
