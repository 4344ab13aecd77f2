//! Cart lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::{CartItemId, ProductId};
use crate::types::money::line_total;

/// One product/quantity/variant entry in a user's cart, joined with the
/// catalog data checkout needs to price and validate it.
///
/// `unit_price` is resolved at read time (the sale price when one is set)
/// and becomes the immutable order-line price if this cart reaches
/// checkout. `stock` is a point-in-time read used for the advisory
/// pre-check only; the authoritative oversell guard runs inside the order
/// transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub unit_price: Decimal,
    pub stock: i32,
}

impl CartLine {
    /// Extended price of this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        line_total(self.unit_price, self.quantity)
    }
}
