//! Single-order status/tracking update endpoint.
//!
//! Accepts the JSON body the back-office order screens post: an optional
//! target status with comment, an optional tracking number, or both.
//! Responds with the `{"success": …, "message": …}` envelope.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use juniper_row_core::{OrderId, OrderStatus};

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::services::orders::{self, OrderUpdate};
use crate::state::AppState;

/// JSON body for the update endpoint.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderInput {
    /// Target status; omitted for tracking-only updates.
    pub status: Option<OrderStatus>,
    /// History comment for a status change.
    pub comment: Option<String>,
    /// New tracking number; independent of status.
    pub tracking_number: Option<String>,
}

/// Apply a status and/or tracking update to one order.
#[instrument(skip(admin, state, input), fields(order_id = id, actor = %admin.0.id))]
pub async fn update_order_status(
    admin: RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateOrderInput>,
) -> Result<Json<serde_json::Value>> {
    orders::update_order(
        state.pool(),
        OrderId::new(id),
        OrderUpdate {
            status: input.status,
            comment: input.comment,
            tracking_number: input.tracking_number,
        },
        admin.0.id,
    )
    .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Order updated successfully",
    })))
}
