//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::{CartError, SessionError};
use store::StoreError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// No buyer is signed in.
    Unauthorized,
    /// The signed-in buyer may not see this resource.
    Forbidden,
    /// Cart reconciliation error.
    Cart(CartError),
    /// Checkout error.
    Checkout(CheckoutError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Sign in required".to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Access denied".to_string()),
            ApiError::Cart(err) => cart_error_to_response(err),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn cart_error_to_response(err: CartError) -> (StatusCode, String) {
    match &err {
        CartError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CartError::OutOfStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        CartError::Store(_) => {
            tracing::error!(error = %err, "cart store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::OutOfStock { .. } | CheckoutError::Persistence(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        CheckoutError::Session(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        ApiError::Cart(err)
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to install Prometheus recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to run migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
