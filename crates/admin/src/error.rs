//! Unified error handling for the admin API.
//!
//! Admin endpoints answer in the `{"success": …, "message": …}` envelope
//! the back-office tooling expects. Server-side failures are captured to
//! Sentry and collapse to a generic message; raw database error text is
//! never echoed to the client, even an admin.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use juniper_row_core::TransitionError;

use crate::db::RepositoryError;
use crate::services::orders::OrderUpdateError;

/// Application-level error type for the admin service.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// An order update was rejected.
    #[error("Order update error: {0}")]
    OrderUpdate(#[from] OrderUpdateError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Admin authentication is required.
    #[error("Admin access required")]
    Forbidden,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let (status, message) = match self {
            Self::Database(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_owned(),
            ),
            Self::OrderUpdate(err) => order_update_response(err),
            Self::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Admin access required".to_owned()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(envelope(&message))).into_response()
    }
}

impl AdminError {
    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::OrderUpdate(OrderUpdateError::Repository(_))
        )
    }
}

/// Map order-update failures to responses.
///
/// Transition rejections describe domain rules and surface verbatim;
/// persistence problems collapse to the generic message.
fn order_update_response(err: OrderUpdateError) -> (StatusCode, String) {
    match err {
        OrderUpdateError::NotFound => (StatusCode::NOT_FOUND, "Order not found".to_owned()),
        OrderUpdateError::Transition(TransitionError::SameStatus(status)) => (
            StatusCode::CONFLICT,
            format!("Order already has status {status}"),
        ),
        OrderUpdateError::Transition(TransitionError::Illegal { from, to }) => (
            StatusCode::CONFLICT,
            format!("Invalid status transition from {from} to {to}"),
        ),
        OrderUpdateError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        OrderUpdateError::Repository(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_owned(),
        ),
    }
}

/// The `{"success": false, "message": …}` body every admin error carries.
fn envelope(message: &str) -> serde_json::Value {
    serde_json::json!({
        "success": false,
        "message": message,
    })
}

/// Result type alias for `AdminError`.
pub type Result<T> = std::result::Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;
    use juniper_row_core::OrderStatus;

    fn status_of(err: AdminError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn status_codes_match_error_class() {
        assert_eq!(
            status_of(AdminError::NotFound("Order".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(AdminError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(AdminError::BadRequest("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn transition_rejections_are_conflicts() {
        let illegal = AdminError::OrderUpdate(OrderUpdateError::Transition(
            TransitionError::Illegal {
                from: OrderStatus::Shipped,
                to: OrderStatus::Pending,
            },
        ));
        assert_eq!(status_of(illegal), StatusCode::CONFLICT);

        let same = AdminError::OrderUpdate(OrderUpdateError::Transition(
            TransitionError::SameStatus(OrderStatus::Pending),
        ));
        assert_eq!(status_of(same), StatusCode::CONFLICT);
    }

    #[test]
    fn database_errors_collapse_to_generic_message() {
        let err = AdminError::Database(RepositoryError::DataCorruption(
            "constraint orders_total_consistent violated".to_string(),
        ));
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
