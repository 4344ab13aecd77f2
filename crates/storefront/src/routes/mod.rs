//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database ping)
//!
//! # Cart
//! GET  /cart                   - Cart contents (JSON)
//! GET  /cart/count             - Cart line count (JSON)
//! POST /cart/add               - Add a product (form, redirects to /cart)
//! POST /cart/update            - Update a line quantity (form)
//! POST /cart/remove            - Remove a line (form)
//! POST /cart/clear             - Empty the cart (form)
//!
//! # Checkout
//! POST /checkout               - Place the order (form, redirects to the
//!                                confirmation on success)
//!
//! # Orders (requires auth)
//! GET  /orders                 - Account order history (JSON)
//! GET  /orders/{number}        - Order confirmation by number (JSON)
//! ```
//!
//! Authentication is out of scope here: the external session layer
//! injects [`crate::middleware::CurrentUser`] into request extensions and
//! the extractors in [`crate::middleware::auth`] pick it up.

pub mod cart;
pub mod checkout;
pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the storefront router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::view_cart))
        .route("/cart/count", get(cart::cart_count))
        .route("/cart/add", post(cart::add_item))
        .route("/cart/update", post(cart::update_item))
        .route("/cart/remove", post(cart::remove_item))
        .route("/cart/clear", post(cart::clear_cart))
        .route("/checkout", post(checkout::place_order))
        .route("/orders", get(orders::order_history))
        .route("/orders/{number}", get(orders::order_confirmation))
}
