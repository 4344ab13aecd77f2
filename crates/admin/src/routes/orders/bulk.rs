//! Bulk order operations endpoint.
//!
//! Accepts the JSON body the order-list screen posts for its bulk
//! actions. Partial success is the normal case: the response carries
//! success/error counts and a bounded error list.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use juniper_row_core::{BulkAction, OrderId, OrderStatus};

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::services::bulk::{self, BulkRequest};
use crate::state::AppState;

/// JSON body for the bulk endpoint.
#[derive(Debug, Deserialize)]
pub struct BulkUpdateInput {
    pub order_ids: Vec<i32>,
    pub action: BulkAction,
    /// Target status for `update_status`.
    pub status: Option<OrderStatus>,
    /// History comment; required for `add_comment`.
    pub comment: Option<String>,
    /// Queue customer notifications for status changes (default true).
    pub notify_customers: Option<bool>,
}

/// Run one bulk action over a batch of orders.
#[instrument(skip(admin, state, input), fields(actor = %admin.0.id, count = input.order_ids.len()))]
pub async fn bulk_update(
    admin: RequireAdminAuth,
    State(state): State<AppState>,
    Json(input): Json<BulkUpdateInput>,
) -> Result<Json<serde_json::Value>> {
    let request = BulkRequest {
        order_ids: input.order_ids.into_iter().map(OrderId::new).collect(),
        action: input.action,
        status: input.status,
        comment: input.comment,
        notify_customers: input.notify_customers.unwrap_or(true),
    };

    let outcome = bulk::process_bulk(state.pool(), request, admin.0.id).await?;

    let mut message = format!("{} order(s) updated successfully", outcome.success_count);
    if outcome.error_count > 0 {
        message.push_str(&format!(", {} failed", outcome.error_count));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": message,
        "success_count": outcome.success_count,
        "error_count": outcome.error_count,
        "errors": outcome.errors,
    })))
}
