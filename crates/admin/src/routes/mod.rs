//! HTTP route handlers for the admin API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (database ping)
//!
//! # Orders
//! GET  /orders                  - Filtered, paginated order list (JSON)
//! GET  /orders/{id}             - Order detail with lines and history
//! POST /orders/{id}/status      - Status and/or tracking update (JSON)
//! POST /orders/bulk             - Bulk status operations (JSON)
//!
//! # Customers
//! GET  /customers               - Customer list with order aggregates
//! GET  /customers/{id}          - Customer detail with their orders
//! ```
//!
//! Every handler requires [`crate::middleware::CurrentAdmin`], injected
//! into request extensions by the external admin auth layer.

pub mod customers;
pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::list::list_orders))
        .route("/orders/bulk", post(orders::bulk::bulk_update))
        .route("/orders/{id}", get(orders::detail::order_detail))
        .route("/orders/{id}/status", post(orders::status::update_order_status))
        .route("/customers", get(customers::list_customers))
        .route("/customers/{id}", get(customers::customer_detail))
}
