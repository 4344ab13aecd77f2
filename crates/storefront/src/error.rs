//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to
//! Sentry before responding. Route handlers return `Result<T, AppError>`;
//! raw database error text never reaches a client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::checkout::{CheckoutError, StockShortage};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized")]
    Unauthorized,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body returned to clients.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    shortages: Option<Vec<StockShortage>>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            shortages: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, body) = match self {
            Self::Database(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Internal server error"),
            ),
            Self::Checkout(err) => checkout_response(err),
            Self::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ErrorBody::new(format!("Not found: {what}")),
            ),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("Sign in required"),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorBody::new(msg)),
        };

        (status, Json(body)).into_response()
    }
}

impl AppError {
    /// Whether this error should be captured to Sentry.
    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Checkout(CheckoutError::Repository(_))
        )
    }
}

/// Map checkout failures to user-safe responses.
///
/// Every variant except `Repository` describes something the customer can
/// act on, so those surface verbatim; persistence problems collapse to the
/// generic message.
fn checkout_response(err: CheckoutError) -> (StatusCode, ErrorBody) {
    match err {
        CheckoutError::EmptyCart => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new("Your cart is empty"),
        ),
        CheckoutError::InsufficientStock(shortages) => (
            StatusCode::CONFLICT,
            ErrorBody {
                error: "Some items in your cart are no longer available in the requested quantity"
                    .to_owned(),
                shortages: Some(shortages),
            },
        ),
        CheckoutError::Oversell { ref name, .. } => (
            StatusCode::CONFLICT,
            ErrorBody::new(format!("{name} just sold out. Please review your cart.")),
        ),
        CheckoutError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorBody::new(msg)),
        CheckoutError::Repository(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::new("Order failed. Please try again."),
        ),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn status_codes_match_error_class() {
        assert_eq!(
            status_of(AppError::NotFound("order".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(AppError::BadRequest("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn checkout_conflicts_use_409() {
        assert_eq!(
            status_of(AppError::Checkout(CheckoutError::InsufficientStock(vec![]))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::Checkout(CheckoutError::EmptyCart)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn database_detail_is_not_leaked() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "secret table detail".to_string(),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // The body is built from the sanitized message only; the detail
        // above is logged, never serialized.
    }
}
