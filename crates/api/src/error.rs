//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;

/// API-level error type that maps to HTTP responses.
///
/// Workflow rejections never land here; they are part of a successful
/// response's presentation.
#[derive(Debug)]
pub enum ApiError {
    /// Unknown session, or nothing committed to render yet.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// A stale write lost against a concurrent one.
    Conflict(String),
    /// Any other checkout or store failure.
    Checkout(CheckoutError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Checkout(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) | ApiError::Conflict(msg) => msg,
            ApiError::Checkout(err) => {
                tracing::error!(error = %err, "checkout error");
                err.to_string()
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::SessionNotFound(_) | CheckoutError::NoCommittedOrder(_) => {
                ApiError::NotFound(err.to_string())
            }
            err if err.is_conflict() => ApiError::Conflict(err.to_string()),
            err => ApiError::Checkout(err),
        }
    }
}
