//! Catalog product.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;
use crate::types::money::effective_price;

/// A catalog product.
///
/// `stock` is the shared, concurrently-mutated resource of the system. It
/// is only ever reduced by the guarded decrement inside the checkout
/// transaction and can never go negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The price a new cart line would be charged at right now.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        effective_price(self.price, self.sale_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_price_prefers_sale_price() {
        let mut product = Product {
            id: ProductId::new(1),
            name: "Linen shirt".to_owned(),
            description: None,
            price: "39.99".parse().expect("decimal"),
            sale_price: Some("29.99".parse().expect("decimal")),
            stock: 10,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(product.effective_price(), product.sale_price.expect("set"));

        product.sale_price = None;
        assert_eq!(product.effective_price(), product.price);
    }
}
