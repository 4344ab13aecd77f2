//! Order detail: header, lines with product names, and the full audit
//! history.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use juniper_row_core::{Order, OrderId};

use crate::db::OrderAdminRepository;
use crate::db::orders::{HistoryEntryDetail, OrderItemDetail};
use crate::error::{AdminError, Result};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Full order detail for the back office.
#[derive(Debug, Serialize)]
pub struct OrderDetailResponse {
    pub number: String,
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
    pub history: Vec<HistoryEntryDetail>,
}

/// Order detail by ID.
#[instrument(skip(_admin, state), fields(order_id = id))]
pub async fn order_detail(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<OrderDetailResponse>> {
    let order_id = OrderId::new(id);
    let repo = OrderAdminRepository::new(state.pool());

    let order = repo
        .get(order_id)
        .await?
        .ok_or_else(|| AdminError::NotFound("Order".to_owned()))?;
    let items = repo.items(order_id).await?;
    let history = repo.history(order_id).await?;

    Ok(Json(OrderDetailResponse {
        number: order.number(),
        order,
        items,
        history,
    }))
}
