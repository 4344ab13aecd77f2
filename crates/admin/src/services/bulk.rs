//! Bulk order operations.
//!
//! A batch runs in one outer transaction with a savepoint per order:
//! a failing order rolls back only its own writes and is recorded as an
//! error string while the loop continues. If nothing in the batch
//! succeeds the outer transaction is rolled back, so an all-failure batch
//! persists nothing. Transition validation is the same canonical table
//! the single-order path uses.

use serde::Serialize;
use sqlx::{Acquire, PgPool, Postgres, Transaction};
use tracing::instrument;

use juniper_row_core::{BulkAction, OrderId, OrderStatus, UserId};

use super::orders::{OrderUpdateError, apply_transition};
use crate::db::orders as orders_repo;

/// Cap on orders per batch; keeps transaction duration predictable.
pub const MAX_BULK_ORDERS: usize = 100;

/// Cap on error strings reported back to the caller.
pub const MAX_REPORTED_ERRORS: usize = 10;

/// A parsed bulk request.
#[derive(Debug, Clone)]
pub struct BulkRequest {
    pub order_ids: Vec<OrderId>,
    pub action: BulkAction,
    /// Target status; required for `update_status`.
    pub status: Option<OrderStatus>,
    /// Comment for history entries; required for `add_comment`, optional
    /// (with per-action defaults) otherwise.
    pub comment: Option<String>,
    /// Whether to queue customer notifications for status changes.
    pub notify_customers: bool,
}

/// Outcome of a committed batch.
#[derive(Debug, Serialize)]
pub struct BulkOutcome {
    pub success_count: usize,
    pub error_count: usize,
    /// Per-order error strings, truncated to [`MAX_REPORTED_ERRORS`].
    pub errors: Vec<String>,
}

impl BulkOutcome {
    fn new(success_count: usize, mut errors: Vec<String>) -> Self {
        let error_count = errors.len();
        errors.truncate(MAX_REPORTED_ERRORS);
        Self {
            success_count,
            error_count,
            errors,
        }
    }
}

/// Run one bulk action over a batch of orders.
///
/// # Errors
///
/// Returns `Validation` for an empty or oversized batch, and for a batch
/// in which every order failed (in which case nothing was persisted).
/// Returns `Repository` if the surrounding transaction machinery fails.
#[instrument(skip(pool, request), fields(action = %request.action, count = request.order_ids.len(), actor = %actor))]
pub async fn process_bulk(
    pool: &PgPool,
    request: BulkRequest,
    actor: UserId,
) -> Result<BulkOutcome, OrderUpdateError> {
    if request.order_ids.is_empty() {
        return Err(OrderUpdateError::Validation("No orders selected".to_owned()));
    }
    if request.order_ids.len() > MAX_BULK_ORDERS {
        return Err(OrderUpdateError::Validation(format!(
            "Too many orders selected. Maximum {MAX_BULK_ORDERS} orders allowed."
        )));
    }

    let mut tx = pool.begin().await?;
    let mut success_count = 0usize;
    let mut errors: Vec<String> = Vec::new();

    for &order_id in &request.order_ids {
        let mut savepoint = tx.begin().await?;
        match process_one(&mut savepoint, order_id, &request, actor).await {
            Ok(()) => {
                savepoint.commit().await?;
                success_count += 1;
            }
            Err(message) => {
                savepoint.rollback().await?;
                errors.push(message);
            }
        }
    }

    if success_count == 0 {
        tx.rollback().await?;
        let preview = errors
            .iter()
            .take(5)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        return Err(OrderUpdateError::Validation(format!(
            "All operations failed: {preview}"
        )));
    }

    tx.commit().await?;

    let outcome = BulkOutcome::new(success_count, errors);
    if outcome.error_count > 0 {
        tracing::warn!(
            success = outcome.success_count,
            failed = outcome.error_count,
            "Bulk order update completed with errors"
        );
    } else {
        tracing::info!(success = outcome.success_count, "Bulk order update completed");
    }

    Ok(outcome)
}

/// Process one order inside its savepoint.
///
/// Returns the per-order error string on failure; the caller rolls the
/// savepoint back so this order's writes disappear while the batch
/// continues.
async fn process_one(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    request: &BulkRequest,
    actor: UserId,
) -> Result<(), String> {
    let order = match orders_repo::get_for_update(&mut *tx, order_id).await {
        Ok(Some(order)) => order,
        Ok(None) => return Err(format!("Order ID {order_id} not found")),
        Err(e) => return Err(persistence_message(order_id, &e.into())),
    };

    match request.action {
        BulkAction::UpdateStatus => {
            let Some(new_status) = request.status else {
                return Err(format!("Status required for order ID {order_id}"));
            };
            let comment = comment_or(request, format!("Bulk status update to {new_status}"));
            apply_transition(tx, &order, new_status, &comment, actor, request.notify_customers)
                .await
                .map_err(|e| update_status_message(order_id, new_status, &e))
        }
        BulkAction::MarkProcessing => {
            let comment = comment_or(request, "Bulk processing update".to_owned());
            apply_transition(
                tx,
                &order,
                OrderStatus::Processing,
                &comment,
                actor,
                request.notify_customers,
            )
            .await
            .map_err(|e| shorthand_message(order_id, &order, "processing", &e))
        }
        BulkAction::MarkShipped => {
            let comment = comment_or(request, "Bulk shipping update".to_owned());
            apply_transition(
                tx,
                &order,
                OrderStatus::Shipped,
                &comment,
                actor,
                request.notify_customers,
            )
            .await
            .map_err(|e| shorthand_message(order_id, &order, "shipped", &e))
        }
        BulkAction::AddComment => {
            let Some(comment) = request
                .comment
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
            else {
                return Err(format!("Comment required for order ID {order_id}"));
            };
            orders_repo::insert_history(&mut *tx, order.id, order.status, comment, actor)
                .await
                .map_err(|e| persistence_message(order_id, &e.into()))
        }
    }
}

fn comment_or(request: &BulkRequest, default: String) -> String {
    request
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map_or(default, str::to_owned)
}

/// Per-order message for an explicit `update_status` failure.
fn update_status_message(
    order_id: OrderId,
    new_status: OrderStatus,
    error: &OrderUpdateError,
) -> String {
    use juniper_row_core::TransitionError;

    match error {
        OrderUpdateError::Transition(TransitionError::SameStatus(status)) => {
            format!("Order ID {order_id} already has status {status}")
        }
        OrderUpdateError::Transition(TransitionError::Illegal { from, .. }) => {
            format!("Invalid status transition for order ID {order_id} from {from} to {new_status}")
        }
        other => persistence_message(order_id, other),
    }
}

/// Per-order message for the `mark_processing`/`mark_shipped` shorthands.
fn shorthand_message(
    order_id: OrderId,
    order: &juniper_row_core::Order,
    target: &str,
    error: &OrderUpdateError,
) -> String {
    match error {
        OrderUpdateError::Transition(_) => format!(
            "Order ID {order_id} cannot be marked as {target} (current status: {status})",
            status = order.status
        ),
        other => persistence_message(order_id, other),
    }
}

/// Generic per-order message for non-domain failures; detail goes to the
/// log, not the caller.
fn persistence_message(order_id: OrderId, error: &OrderUpdateError) -> String {
    tracing::error!(order_id = %order_id, error = %error, "Bulk order step failed");
    format!("Failed to update order ID {order_id}")
}
