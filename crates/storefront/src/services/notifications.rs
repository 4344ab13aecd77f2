//! Notification outbox dispatch.
//!
//! The checkout transaction only appends outbox rows; this module owns
//! delivery. A polling loop claims undispatched rows with
//! `FOR UPDATE SKIP LOCKED`, hands them to the configured dispatcher, and
//! marks the delivered ones. Failed deliveries are logged and picked up
//! again on a later poll.
//!
//! This loop drains the checkout-side events (`order_confirmed`,
//! `admin_alert`); the admin binary runs its own loop for the
//! `status_changed` events its endpoints produce.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use juniper_row_core::{
    NotificationDispatcher, NotificationKind, NotifyError, OrderId, OrderStatus, OutboxEvent,
    OutboxEventId,
};

use crate::db::RepositoryError;

/// Number of outbox rows claimed per poll.
const DISPATCH_BATCH_SIZE: i64 = 20;

/// Dispatcher that records deliveries in the log.
///
/// The real mail provider sits behind an external relay; this service
/// only needs a structured record that the hand-off happened.
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

/// Spawn the background outbox drain loop.
pub fn spawn_outbox_dispatcher(
    pool: PgPool,
    dispatcher: Arc<dyn NotificationDispatcher>,
    poll_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match drain_once(&pool, dispatcher.as_ref()).await {
                Ok(0) => {}
                Ok(count) => tracing::debug!(count, "Dispatched outbox notifications"),
                Err(e) => tracing::warn!(error = %e, "Outbox drain failed"),
            }
        }
    })
}

/// Claim and deliver one batch of pending notifications.
///
/// Returns the number of rows successfully dispatched. Delivery failures
/// are logged and left unclaimed for a later poll; they never propagate.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the claim or mark queries fail.
pub async fn drain_once(
    pool: &PgPool,
    dispatcher: &dyn NotificationDispatcher,
) -> Result<usize, RepositoryError> {
    let mut tx = pool.begin().await?;

    let events: Vec<OutboxEvent> = sqlx::query_as(
        r"
        SELECT id, order_id, event, payload, created_at, dispatched_at
        FROM notification_outbox
        WHERE dispatched_at IS NULL
          AND event IN ('order_confirmed', 'admin_alert')
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
        match deliver(dispatcher, event).await {
            Ok(()) => delivered.push(event.id),
            Err(e) => tracing::warn!(
                event_id = %event.id,
                order_id = %event.order_id,
                error = %e,
                "Notification delivery failed; will retry"
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

/// Route one outbox row to the matching dispatcher call.
pub(crate) async fn deliver(
    dispatcher: &dyn NotificationDispatcher,
    event: &OutboxEvent,
) -> Result<(), NotifyError> {
    match event.event {
        NotificationKind::OrderConfirmed => dispatcher.order_confirmed(event.order_id).await,
        NotificationKind::AdminAlert => dispatcher.admin_alert(event.order_id).await,
        NotificationKind::StatusChanged => {
            let status: OrderStatus = event
                .payload
                .get("status")
                .and_then(serde_json::Value::as_str)
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| {
                    NotifyError("status_changed event is missing a status payload".to_owned())
                })?;
            dispatcher.status_changed(event.order_id, status).await
        }
    }
}
