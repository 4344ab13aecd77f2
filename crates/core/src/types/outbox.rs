//! Notification outbox records.
//!
//! State-changing transactions append outbox rows instead of sending
//! notifications inline; the dispatch loops in the binaries deliver them
//! after commit. A delivery failure therefore can never be mistaken for a
//! failed state change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{OrderId, OutboxEventId};

/// Kind of notification recorded in the outbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "notification_event", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Customer order confirmation for a newly placed order.
    OrderConfirmed,
    /// Customer-facing status change notice (payload carries the status).
    StatusChanged,
    /// New-order alert to the back office.
    AdminAlert,
}

/// A pending or delivered notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct OutboxEvent {
    pub id: OutboxEventId,
    pub order_id: OrderId,
    pub event: NotificationKind,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
}
