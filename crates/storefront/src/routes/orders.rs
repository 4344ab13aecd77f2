//! Order confirmation and account order history.
//!
//! Reads only; all order mutation happens at checkout or in the back
//! office. Every query is scoped to the authenticated owner.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use juniper_row_core::{
    Order, OrderItem, OrderStatus, PaymentMethod, ProductId, ShippingDetails,
    StatusHistoryEntry, format_usd, parse_order_number,
};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// One line on the confirmation page.
#[derive(Debug, Serialize)]
pub struct OrderLineView {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl From<OrderItem> for OrderLineView {
    fn from(item: OrderItem) -> Self {
        Self {
            line_total: item.line_total(),
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

/// Full order view for the confirmation page.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub number: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    pub total_amount: Decimal,
    pub total_display: String,
    pub shipping: ShippingDetails,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderLineView>,
    pub history: Vec<HistoryView>,
}

/// One audit-trail entry shown to the customer.
#[derive(Debug, Serialize)]
pub struct HistoryView {
    pub status: OrderStatus,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<StatusHistoryEntry> for HistoryView {
    fn from(entry: StatusHistoryEntry) -> Self {
        Self {
            status: entry.status,
            comment: entry.comment,
            created_at: entry.created_at,
        }
    }
}

/// One row in the account order history.
#[derive(Debug, Serialize)]
pub struct OrderSummaryView {
    pub number: String,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderSummaryView {
    fn from(order: &Order) -> Self {
        Self {
            number: order.number(),
            status: order.status,
            total_amount: order.total_amount,
            tracking_number: order.tracking_number.clone(),
            created_at: order.created_at,
        }
    }
}

/// Order confirmation, looked up by customer-facing order number.
#[instrument(skip(user, state), fields(user_id = %user.0.id, number = %number))]
pub async fn order_confirmation(
    user: RequireUser,
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<OrderView>> {
    let order_id =
        parse_order_number(&number).ok_or_else(|| AppError::NotFound("order".to_owned()))?;

    let repo = OrderRepository::new(state.pool());
    let order = repo
        .get_for_user(user.0.id, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_owned()))?;
    let items = repo.items(order.id).await?;
    let history = repo.history(order.id).await?;

    Ok(Json(OrderView {
        number: order.number(),
        status: order.status,
        payment_method: order.payment_method,
        subtotal: order.subtotal,
        tax_amount: order.tax_amount,
        shipping_amount: order.shipping_amount,
        total_amount: order.total_amount,
        total_display: format_usd(order.total_amount),
        shipping: ShippingDetails {
            name: order.shipping_name,
            email: order.shipping_email,
            address: order.shipping_address,
            city: order.shipping_city,
            state: order.shipping_state,
            zip: order.shipping_zip,
            country: order.shipping_country,
        },
        tracking_number: order.tracking_number,
        notes: order.notes,
        created_at: order.created_at,
        items: items.into_iter().map(OrderLineView::from).collect(),
        history: history.into_iter().map(HistoryView::from).collect(),
    }))
}

/// The authenticated user's order history, newest first.
#[instrument(skip(user, state), fields(user_id = %user.0.id))]
pub async fn order_history(
    user: RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderSummaryView>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.0.id)
        .await?;

    Ok(Json(orders.iter().map(OrderSummaryView::from).collect()))
}
