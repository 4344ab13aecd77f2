//! Cart route handlers.
//!
//! Mutations are plain form posts that redirect back to the cart, the way
//! the shop pages submit them; reads return JSON views.

use axum::{
    Form, Json,
    extract::State,
    response::Redirect,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use juniper_row_core::{CartItemId, CartLine, ProductId, format_usd};

use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub item_count: usize,
    pub subtotal: Decimal,
    pub subtotal_display: String,
}

impl From<Vec<CartLine>> for CartView {
    fn from(lines: Vec<CartLine>) -> Self {
        let subtotal: Decimal = lines.iter().map(CartLine::line_total).sum();
        let items: Vec<CartLineView> = lines
            .into_iter()
            .map(|line| CartLineView {
                line_total: line.line_total(),
                id: line.id,
                product_id: line.product_id,
                name: line.name,
                quantity: line.quantity,
                size: line.size,
                color: line.color,
                unit_price: line.unit_price,
            })
            .collect();

        Self {
            item_count: items.len(),
            subtotal,
            subtotal_display: format_usd(subtotal),
            items,
        }
    }
}

/// Input for adding a product to the cart.
#[derive(Debug, Deserialize)]
pub struct AddToCartInput {
    pub product_id: i32,
    pub quantity: Option<i32>,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Input for updating a cart line.
#[derive(Debug, Deserialize)]
pub struct UpdateCartInput {
    pub cart_item_id: i32,
    pub quantity: i32,
}

/// Input for removing a cart line.
#[derive(Debug, Deserialize)]
pub struct RemoveCartInput {
    pub cart_item_id: i32,
}

/// Cart contents for the current user.
#[instrument(skip(user, state), fields(user_id = %user.0.id))]
pub async fn view_cart(
    user: RequireUser,
    State(state): State<AppState>,
) -> Result<Json<CartView>> {
    let lines = CartRepository::new(state.pool())
        .lines_for_user(user.0.id)
        .await?;

    Ok(Json(CartView::from(lines)))
}

/// Number of lines in the current user's cart.
#[instrument(skip(user, state), fields(user_id = %user.0.id))]
pub async fn cart_count(
    user: RequireUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>> {
    let count = CartRepository::new(state.pool()).count(user.0.id).await?;
    Ok(Json(serde_json::json!({ "count": count })))
}

/// Add a product to the cart.
#[instrument(skip(user, state, input), fields(user_id = %user.0.id, product_id = input.product_id))]
pub async fn add_item(
    user: RequireUser,
    State(state): State<AppState>,
    Form(input): Form<AddToCartInput>,
) -> Result<Redirect> {
    let quantity = input.quantity.unwrap_or(1);
    if quantity < 1 {
        return Err(AppError::BadRequest("Quantity must be at least 1".to_owned()));
    }

    let product_id = ProductId::new(input.product_id);
    if ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("product".to_owned()));
    }

    CartRepository::new(state.pool())
        .add_line(
            user.0.id,
            product_id,
            quantity,
            input.size.as_deref().filter(|s| !s.is_empty()),
            input.color.as_deref().filter(|s| !s.is_empty()),
        )
        .await?;

    Ok(Redirect::to("/cart"))
}

/// Update the quantity of a cart line.
#[instrument(skip(user, state, input), fields(user_id = %user.0.id))]
pub async fn update_item(
    user: RequireUser,
    State(state): State<AppState>,
    Form(input): Form<UpdateCartInput>,
) -> Result<Redirect> {
    if input.quantity < 1 {
        return Err(AppError::BadRequest("Quantity must be at least 1".to_owned()));
    }

    let updated = CartRepository::new(state.pool())
        .update_quantity(user.0.id, CartItemId::new(input.cart_item_id), input.quantity)
        .await?;
    if !updated {
        return Err(AppError::NotFound("cart item".to_owned()));
    }

    Ok(Redirect::to("/cart"))
}

/// Remove a cart line.
#[instrument(skip(user, state, input), fields(user_id = %user.0.id))]
pub async fn remove_item(
    user: RequireUser,
    State(state): State<AppState>,
    Form(input): Form<RemoveCartInput>,
) -> Result<Redirect> {
    CartRepository::new(state.pool())
        .remove(user.0.id, CartItemId::new(input.cart_item_id))
        .await?;

    Ok(Redirect::to("/cart"))
}

/// Empty the cart.
#[instrument(skip(user, state), fields(user_id = %user.0.id))]
pub async fn clear_cart(user: RequireUser, State(state): State<AppState>) -> Result<Redirect> {
    CartRepository::new(state.pool()).clear(user.0.id).await?;
    Ok(Redirect::to("/cart"))
}
