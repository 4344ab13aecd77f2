//! Single-order lifecycle operations.
//!
//! Transitions are validated against the canonical table in
//! `juniper_row_core::OrderStatus`; this module owns applying a validated
//! change (status row update, history entry, outbox row) inside one
//! transaction. The bulk processor reuses [`apply_transition`] so both
//! call sites share one state machine.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use juniper_row_core::{
    NotificationKind, Order, OrderId, OrderStatus, TransitionError, UserId,
};

use crate::db::{RepositoryError, orders};

/// Admin request to update one order.
///
/// A status change and a tracking-number update are independent
/// operations; a single request may carry either or both, and both apply
/// in one transaction.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub comment: Option<String>,
    pub tracking_number: Option<String>,
}

/// Failures updating an order.
#[derive(Debug, Error)]
pub enum OrderUpdateError {
    /// No such order.
    #[error("order not found")]
    NotFound,

    /// The requested transition was rejected; the order is unmodified.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The request itself was malformed.
    #[error("{0}")]
    Validation(String),

    /// Persistence failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderUpdateError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Apply a status change and/or tracking update to one order.
///
/// Everything happens in one transaction against a row locked with
/// `FOR UPDATE`; an invalid transition leaves the order (including
/// `updated_at`) untouched. The status-change notification goes through
/// the outbox, so its delivery can never undo the committed change.
///
/// # Errors
///
/// Returns `NotFound` for a missing order, `Transition` for a rejected
/// status change, `Validation` for an empty request, and `Repository` on
/// persistence failures.
#[instrument(skip(pool, update), fields(order_id = %order_id, actor = %actor))]
pub async fn update_order(
    pool: &PgPool,
    order_id: OrderId,
    update: OrderUpdate,
    actor: UserId,
) -> Result<(), OrderUpdateError> {
    let tracking = update
        .tracking_number
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if update.status.is_none() && tracking.is_none() {
        return Err(OrderUpdateError::Validation(
            "Nothing to update: provide a status or a tracking number".to_owned(),
        ));
    }

    let mut tx = pool.begin().await?;

    let order = orders::get_for_update(&mut *tx, order_id)
        .await?
        .ok_or(OrderUpdateError::NotFound)?;

    if let Some(new_status) = update.status {
        let comment = update
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("");
        apply_transition(&mut tx, &order, new_status, comment, actor, true).await?;
    }

    if let Some(tracking_number) = tracking {
        if !orders::set_tracking(&mut *tx, order_id, tracking_number).await? {
            return Err(OrderUpdateError::NotFound);
        }
        let status_now = update.status.unwrap_or(order.status);
        orders::insert_history(
            &mut *tx,
            order_id,
            status_now,
            &format!("Tracking number updated: {tracking_number}"),
            actor,
        )
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        order_id = %order_id,
        new_status = ?update.status,
        tracking = tracking.is_some(),
        "Order updated"
    );

    Ok(())
}

/// Apply one validated status transition inside an open transaction.
///
/// Shared by the single-order path above and the bulk processor: validate
/// the edge against the canonical table, apply the status row update
/// (stamping lifecycle timestamps), append the history entry, and record
/// the `status_changed` outbox row when `notify` is set.
///
/// # Errors
///
/// Returns `Transition` for a rejected edge (nothing written), `NotFound`
/// if the order row vanished, and `Repository` on persistence failures.
pub async fn apply_transition(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order: &Order,
    new_status: OrderStatus,
    comment: &str,
    actor: UserId,
    notify: bool,
) -> Result<(), OrderUpdateError> {
    order.status.validate_transition(new_status)?;

    if !orders::apply_status(&mut *tx, order.id, new_status).await? {
        return Err(OrderUpdateError::NotFound);
    }
    orders::insert_history(&mut *tx, order.id, new_status, comment, actor).await?;

    if notify {
        orders::insert_outbox(
            &mut *tx,
            order.id,
            NotificationKind::StatusChanged,
            serde_json::json!({ "status": new_status }),
        )
        .await?;
    }

    Ok(())
}
