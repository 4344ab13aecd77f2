//! Status-change notification dispatch.
//!
//! Admin side of the notification outbox. The status endpoints only
//! append `status_changed` rows inside their transactions; this loop
//! claims those rows after commit (`FOR UPDATE SKIP LOCKED`), hands them
//! to the dispatcher, and marks the delivered ones. Checkout-side events
//! (`order_confirmed`, `admin_alert`) belong to the storefront's loop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use juniper_row_core::{
    NotificationDispatcher, NotifyError, OrderId, OrderStatus, OutboxEvent, OutboxEventId,
};

use crate::db::RepositoryError;

/// Number of outbox rows claimed per poll.
const DISPATCH_BATCH_SIZE: i64 = 20;

/// Dispatcher that records deliveries in the log; the mail relay itself
/// is an external collaborator.
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn order_confirmed(&self, order_id: OrderId) -> Result<(), NotifyError> {
        tracing::info!(order_id = %order_id, "Notification: order confirmation");
        Ok(())
    }

    async fn status_changed(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<(), NotifyError> {
        tracing::info!(order_id = %order_id, status = %new_status, "Notification: status change");
        Ok(())
    }

    async fn admin_alert(&self, order_id: OrderId) -> Result<(), NotifyError> {
        tracing::info!(order_id = %order_id, "Notification: admin new-order alert");
        Ok(())
    }
}

/// Spawn the background loop draining `status_changed` events.
pub fn spawn_status_dispatcher(
    pool: PgPool,
    dispatcher: Arc<dyn NotificationDispatcher>,
    poll_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match drain_status_events(&pool, dispatcher.as_ref()).await {
                Ok(0) => {}
                Ok(count) => tracing::debug!(count, "Dispatched status notifications"),
                Err(e) => tracing::warn!(error = %e, "Status outbox drain failed"),
            }
        }
    })
}

/// Claim and deliver one batch of pending status-change notifications.
///
/// Returns the number delivered. A failed delivery is logged and its row
/// left unclaimed so a later poll retries it; it never propagates.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the claim or mark queries fail.
pub async fn drain_status_events(
    pool: &PgPool,
    dispatcher: &dyn NotificationDispatcher,
) -> Result<usize, RepositoryError> {
    let mut tx = pool.begin().await?;

    let events: Vec<OutboxEvent> = sqlx::query_as(
        r"
        SELECT id, order_id, event, payload, created_at, dispatched_at
        FROM notification_outbox
        WHERE dispatched_at IS NULL
          AND event = 'status_changed'
        ORDER BY id
        LIMIT $1
        FOR UPDATE SKIP LOCKED
        ",
    )
    .bind(DISPATCH_BATCH_SIZE)
    .fetch_all(&mut *tx)
    .await?;

    let mut delivered: Vec<OutboxEventId> = Vec::with_capacity(events.len());
    for event in &events {
        let status: Option<OrderStatus> = event
            .payload
            .get("status")
            .and_then(serde_json::Value::as_str)
            .and_then(|s| s.parse().ok());

        let result = match status {
            Some(status) => dispatcher.status_changed(event.order_id, status).await,
            None => Err(NotifyError(
                "status_changed event is missing a status payload".to_owned(),
            )),
        };

        match result {
            Ok(()) => delivered.push(event.id),
            Err(e) => tracing::warn!(
                event_id = %event.id,
                order_id = %event.order_id,
                error = %e,
                "Status notification delivery failed; will retry"
            ),
        }
    }

    if !delivered.is_empty() {
        sqlx::query("UPDATE notification_outbox SET dispatched_at = NOW() WHERE id = ANY($1)")
            .bind(delivered.iter().map(|id| id.as_i32()).collect::<Vec<i32>>())
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(delivered.len())
}
