//! Error responses.
//!
//! # Design Decisions
//! - Every error body is `{"error": "..."}`
//! - Breaker-open maps to 503 with `Retry-After` in whole seconds
//! - Upstream failures map to 502; internal detail is logged, not returned

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::InvalidVariant;
use crate::service::FetchError;

/// Errors a handler can return.
#[derive(Debug)]
pub enum ApiError {
    Fetch(FetchError),
    InvalidVariant(InvalidVariant),
    BadRequest(String),
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidVariant(v) => ApiError::InvalidVariant(v),
            other => ApiError::Fetch(other),
        }
    }
}

impl From<InvalidVariant> for ApiError {
    fn from(err: InvalidVariant) -> Self {
        ApiError::InvalidVariant(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidVariant(v) => error_body(StatusCode::BAD_REQUEST, v.to_string()),
            ApiError::BadRequest(message) => error_body(StatusCode::BAD_REQUEST, message),
            ApiError::Fetch(FetchError::BreakerOpen {
                upstream,
                retry_after,
            }) => {
                tracing::warn!(upstream = %upstream, retry_after = ?retry_after, "Rejecting request, circuit open");
                let mut response = error_body(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable".to_string(),
                );
                let secs = retry_after.as_secs().max(1);
                if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                response
            }
            ApiError::Fetch(FetchError::Upstream { upstream, source }) => {
                tracing::error!(upstream = %upstream, error = %source, "Upstream fetch failed");
                error_body(
                    StatusCode::BAD_GATEWAY,
                    format!("Failed to retrieve data from {upstream}"),
                )
            }
            ApiError::Fetch(FetchError::InvalidVariant(v)) => {
                error_body(StatusCode::BAD_REQUEST, v.to_string())
            }
        }
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
