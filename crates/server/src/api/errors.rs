//! API error types mapped to HTTP status codes.
//!
//! Every [`ApiError`] renders as `{"message": "..."}`, plus an `"error"` detail
//! string when one is available (scorer stderr, parse error, reported message).

use crate::resolver::ResolveError;
use crate::scorer::ScorerError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error type that implements `IntoResponse`.
///
/// - `BadRequest` → 400
/// - `NotFound` → 404
/// - `GatewayTimeout` → 504
/// - `Internal` → 500
#[derive(Debug)]
pub enum ApiError {
    /// Invalid request parameters (400).
    BadRequest(String),
    /// Resolution yielded no records, or no such route (404).
    NotFound(String),
    /// The scorer did not answer in time (504).
    GatewayTimeout { message: String, detail: String },
    /// Scorer or store failure (500).
    Internal {
        message: String,
        detail: Option<String>,
    },
}

impl From<ScorerError> for ApiError {
    fn from(err: ScorerError) -> Self {
        let detail = err.detail();
        match err {
            ScorerError::Timeout(_) => ApiError::GatewayTimeout {
                message: "Scorer timed out".into(),
                detail,
            },
            ScorerError::Spawn { .. } | ScorerError::Process { .. } => ApiError::Internal {
                message: "Error executing scorer".into(),
                detail: Some(detail),
            },
            ScorerError::Output(_) => ApiError::Internal {
                message: "Error parsing scorer output".into(),
                detail: Some(detail),
            },
            ScorerError::Reported(_) => ApiError::Internal {
                message: "Error from scorer".into(),
                detail: Some(detail),
            },
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NoFilterProvided
            | ResolveError::InvalidFilter(_)
            | ResolveError::InvalidLanguageSelection(_) => ApiError::BadRequest(err.to_string()),
            ResolveError::NotFound(_) => ApiError::NotFound(err.to_string()),
            ResolveError::UpstreamScorerFailure(inner) => inner.into(),
            ResolveError::Store(inner) => {
                tracing::error!("Store failure: {}", inner);
                ApiError::Internal {
                    message: "Server error".into(),
                    detail: Some(inner.to_string()),
                }
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::GatewayTimeout { message, detail } => {
                (StatusCode::GATEWAY_TIMEOUT, message, Some(detail))
            }
            ApiError::Internal { message, detail } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message, detail)
            }
        };
        let body = match detail {
            Some(detail) => json!({ "message": message, "error": detail }),
            None => json!({ "message": message }),
        };
        (status, axum::Json(body)).into_response()
    }
}
