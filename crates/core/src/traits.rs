//! Collaborator seams consumed by the order core.
//!
//! Price/tax/shipping formulas and notification delivery are external
//! concerns; the core talks to them through these traits so checkout and
//! the status machine never embed either.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::id::OrderId;
use crate::types::status::OrderStatus;

/// Pluggable tax and shipping computation, parameterized by subtotal.
pub trait PricingStrategy: Send + Sync {
    /// Tax charged on an order with the given subtotal.
    fn tax(&self, subtotal: Decimal) -> Decimal;

    /// Shipping charged on an order with the given subtotal.
    fn shipping(&self, subtotal: Decimal) -> Decimal;
}

/// A notification delivery failed.
///
/// Callers log and swallow this; delivery problems must never surface as
/// a failed state change.
#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Best-effort customer and back-office notification delivery.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Order confirmation for a newly placed order.
    async fn order_confirmed(&self, order_id: OrderId) -> Result<(), NotifyError>;

    /// Customer-facing notice that an order changed status.
    async fn status_changed(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<(), NotifyError>;

    /// New-order alert to the back office.
    async fn admin_alert(&self, order_id: OrderId) -> Result<(), NotifyError>;
}
