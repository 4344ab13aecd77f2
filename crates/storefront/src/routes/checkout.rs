//! Checkout route handler.

use axum::{Form, extract::State, response::Redirect};
use tracing::instrument;

use juniper_row_core::order_number;

use crate::db::CartRepository;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::services::checkout::{self, CheckoutRequest};
use crate::state::AppState;

/// Place an order from the current cart.
///
/// Runs the full checkout pipeline: input validation, cart snapshot,
/// advisory stock check, then the atomic order transaction. On success
/// redirects to the order confirmation.
#[instrument(skip(user, state, input), fields(user_id = %user.0.id))]
pub async fn place_order(
    user: RequireUser,
    State(state): State<AppState>,
    Form(input): Form<CheckoutRequest>,
) -> Result<Redirect> {
    let validated = input.validate()?;

    let lines = CartRepository::new(state.pool())
        .lines_for_user(user.0.id)
        .await?;
    let snapshot = checkout::build_snapshot(lines, state.pricing())?;
    checkout::validate_stock(&snapshot)?;

    let order_id = checkout::place_order(state.pool(), user.0.id, &snapshot, &validated).await?;

    Ok(Redirect::to(&format!("/orders/{}", order_number(order_id))))
}
