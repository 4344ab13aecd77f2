//! Core types for Juniper Row.

pub mod cart;
pub mod id;
pub mod money;
pub mod order;
pub mod outbox;
pub mod product;
pub mod status;

pub use cart::CartLine;
pub use id::*;
pub use money::{OrderTotals, effective_price, format_usd, line_total};
pub use order::{
    Order, OrderItem, ShippingDetails, StatusHistoryEntry, order_number, parse_order_number,
};
pub use outbox::{NotificationKind, OutboxEvent};
pub use product::Product;
pub use status::{BulkAction, OrderStatus, PaymentMethod, TransitionError};
