//! Orders, their immutable lines, and the audit history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::{OrderId, OrderItemId, ProductId, UserId};
use crate::types::money::line_total;
use crate::types::status::{OrderStatus, PaymentMethod};

/// A committed order.
///
/// Created once, atomically, at checkout. Afterwards only the status
/// machine mutates it: `status`, `updated_at`, the lifecycle timestamps,
/// and `tracking_number`. The money columns are frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub shipping_name: String,
    pub shipping_email: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_zip: String,
    pub shipping_country: String,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Customer-facing order number, e.g. `JR-000042`.
    #[must_use]
    pub fn number(&self) -> String {
        order_number(self.id)
    }
}

/// Format an order id as a customer-facing order number.
#[must_use]
pub fn order_number(id: OrderId) -> String {
    format!("JR-{:06}", id.as_i32())
}

/// Parse a customer-facing order number back into an id.
#[must_use]
pub fn parse_order_number(number: &str) -> Option<OrderId> {
    let digits = number.strip_prefix("JR-")?;
    digits.parse::<i32>().ok().map(OrderId::new)
}

/// An order line: the price snapshot taken at checkout.
///
/// `unit_price` is copied from the cart snapshot and is never recomputed
/// from the catalog, so later price changes cannot alter a placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl OrderItem {
    /// Extended price of this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        line_total(self.unit_price, self.quantity)
    }
}

/// Append-only audit record of one lifecycle change.
///
/// Exactly one entry exists per successful status change, plus the
/// `pending` entry written at order creation and any tracking-number or
/// comment entries added by the back office.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct StatusHistoryEntry {
    pub id: i32,
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub comment: String,
    pub actor_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Shipping details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_number_is_zero_padded() {
        assert_eq!(order_number(OrderId::new(42)), "JR-000042");
        assert_eq!(order_number(OrderId::new(1_234_567)), "JR-1234567");
    }

    #[test]
    fn order_number_parses_back() {
        assert_eq!(parse_order_number("JR-000042"), Some(OrderId::new(42)));
        assert_eq!(parse_order_number("JR-1234567"), Some(OrderId::new(1_234_567)));
        assert_eq!(parse_order_number("000042"), None);
        assert_eq!(parse_order_number("JR-x"), None);
    }

    #[test]
    fn order_item_total_uses_snapshot_price() {
        let item = OrderItem {
            id: OrderItemId::new(1),
            order_id: OrderId::new(1),
            product_id: ProductId::new(9),
            quantity: 3,
            unit_price: "12.50".parse().expect("decimal"),
        };
        assert_eq!(item.line_total(), "37.50".parse::<Decimal>().expect("decimal"));
    }
}
