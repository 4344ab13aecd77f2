//! The order lifecycle status machine.
//!
//! [`OrderStatus::transitions`] is the one transition table in the
//! workspace. The single-order admin path and the bulk path both validate
//! against it; there is deliberately no second, looser table for batches.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of an order.
///
/// `Pending` is set exactly once, at checkout. Every later change must
/// follow an edge of the transition table. `Delivered` and `Cancelled`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Legal next statuses from this one.
    #[must_use]
    pub const fn transitions(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Processing, Self::Cancelled],
            Self::Processing => &[Self::Shipped, Self::Cancelled],
            Self::Shipped => &[Self::Delivered, Self::Cancelled],
            Self::Delivered | Self::Cancelled => &[],
        }
    }

    /// Whether the edge `self -> next` exists in the transition table.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.transitions().contains(&next)
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.transitions().is_empty()
    }

    /// Validate a requested transition, leaving rejection details to the
    /// caller. Same-status requests are rejected as no-ops rather than
    /// silently skipped.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::SameStatus`] if `next == self`, and
    /// [`TransitionError::Illegal`] if the edge is not in the table.
    pub fn validate_transition(self, next: Self) -> Result<(), TransitionError> {
        if self == next {
            return Err(TransitionError::SameStatus(self));
        }
        if !self.can_transition_to(next) {
            return Err(TransitionError::Illegal {
                from: self,
                to: next,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// A rejected status change. The order is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The order already has the requested status.
    #[error("order is already {0}")]
    SameStatus(OrderStatus),

    /// The edge is not in the transition table.
    #[error("invalid status transition from {from} to {to}")]
    Illegal { from: OrderStatus, to: OrderStatus },
}

/// Batch operations accepted by the bulk order endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    /// Transition every order to an explicit target status.
    UpdateStatus,
    /// Shorthand for `pending -> processing`.
    MarkProcessing,
    /// Shorthand for `processing -> shipped`.
    MarkShipped,
    /// Append a history comment without changing status.
    AddComment,
}

impl std::fmt::Display for BulkAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::UpdateStatus => "update_status",
            Self::MarkProcessing => "mark_processing",
            Self::MarkShipped => "mark_shipped",
            Self::AddComment => "add_comment",
        };
        write!(f, "{s}")
    }
}

/// Payment methods accepted at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    Paypal,
    CashOnDelivery,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn transition_table_matches_lifecycle() {
        assert_eq!(
            OrderStatus::Pending.transitions(),
            &[OrderStatus::Processing, OrderStatus::Cancelled]
        );
        assert_eq!(
            OrderStatus::Processing.transitions(),
            &[OrderStatus::Shipped, OrderStatus::Cancelled]
        );
        assert_eq!(
            OrderStatus::Shipped.transitions(),
            &[OrderStatus::Delivered, OrderStatus::Cancelled]
        );
        assert!(OrderStatus::Delivered.transitions().is_empty());
        assert!(OrderStatus::Cancelled.transitions().is_empty());
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for status in OrderStatus::ALL {
            let terminal = matches!(status, OrderStatus::Delivered | OrderStatus::Cancelled);
            assert_eq!(status.is_terminal(), terminal, "{status}");
            if terminal {
                for next in OrderStatus::ALL {
                    assert!(!status.can_transition_to(next), "{status} -> {next}");
                }
            }
        }
    }

    #[test]
    fn same_status_is_rejected_as_noop() {
        for status in OrderStatus::ALL {
            assert_eq!(
                status.validate_transition(status),
                Err(TransitionError::SameStatus(status))
            );
        }
    }

    #[test]
    fn skipping_a_stage_is_illegal() {
        // Orders march through processing and shipped one step at a time;
        // there are no shortcut edges.
        assert_eq!(
            OrderStatus::Pending.validate_transition(OrderStatus::Shipped),
            Err(TransitionError::Illegal {
                from: OrderStatus::Pending,
                to: OrderStatus::Shipped,
            })
        );
        assert_eq!(
            OrderStatus::Processing.validate_transition(OrderStatus::Delivered),
            Err(TransitionError::Illegal {
                from: OrderStatus::Processing,
                to: OrderStatus::Delivered,
            })
        );
    }

    #[test]
    fn backwards_edges_are_illegal() {
        assert!(
            OrderStatus::Shipped
                .validate_transition(OrderStatus::Pending)
                .is_err()
        );
        assert!(
            OrderStatus::Delivered
                .validate_transition(OrderStatus::Cancelled)
                .is_err()
        );
    }

    #[test]
    fn legal_edges_validate() {
        assert!(
            OrderStatus::Pending
                .validate_transition(OrderStatus::Processing)
                .is_ok()
        );
        assert!(
            OrderStatus::Processing
                .validate_transition(OrderStatus::Shipped)
                .is_ok()
        );
        assert!(
            OrderStatus::Shipped
                .validate_transition(OrderStatus::Delivered)
                .is_ok()
        );
        assert!(
            OrderStatus::Shipped
                .validate_transition(OrderStatus::Cancelled)
                .is_ok()
        );
    }

    #[test]
    fn status_parses_and_displays() {
        for status in OrderStatus::ALL {
            let parsed = OrderStatus::from_str(&status.to_string()).expect("round trip");
            assert_eq!(parsed, status);
        }
        assert!(OrderStatus::from_str("refunded").is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&OrderStatus::Processing).expect("serialize");
        assert_eq!(json, "\"processing\"");
        let action: BulkAction = serde_json::from_str("\"mark_shipped\"").expect("deserialize");
        assert_eq!(action, BulkAction::MarkShipped);
        let method: PaymentMethod =
            serde_json::from_str("\"cash_on_delivery\"").expect("deserialize");
        assert_eq!(method, PaymentMethod::CashOnDelivery);
    }
}
