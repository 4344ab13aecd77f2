//! Money arithmetic on `rust_decimal::Decimal`.
//!
//! All amounts in the system are decimal dollars with two fraction digits
//! at rest; floats never touch a price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The price a cart line is charged at: the sale price when one is set,
/// otherwise the regular price.
#[must_use]
pub fn effective_price(price: Decimal, sale_price: Option<Decimal>) -> Decimal {
    sale_price.unwrap_or(price)
}

/// Extended line total (`unit_price * quantity`).
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Format an amount for display, e.g. `$45.00`.
#[must_use]
pub fn format_usd(amount: Decimal) -> String {
    format!("${amount:.2}")
}

/// Order charges frozen at checkout.
///
/// `total_amount` is stored alongside its parts rather than recomputed, so
/// the `total = subtotal + tax + shipping` invariant survives in the
/// orders table verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    pub total_amount: Decimal,
}

impl OrderTotals {
    /// Build totals from a subtotal and the strategy-computed charges.
    #[must_use]
    pub fn new(subtotal: Decimal, tax_amount: Decimal, shipping_amount: Decimal) -> Self {
        Self {
            subtotal,
            tax_amount,
            shipping_amount,
            total_amount: subtotal + tax_amount + shipping_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("decimal literal")
    }

    #[test]
    fn sale_price_wins_when_present() {
        assert_eq!(effective_price(dec("19.99"), Some(dec("14.99"))), dec("14.99"));
        assert_eq!(effective_price(dec("19.99"), None), dec("19.99"));
    }

    #[test]
    fn line_total_extends_unit_price() {
        assert_eq!(line_total(dec("10.00"), 2), dec("20.00"));
        assert_eq!(line_total(dec("0.99"), 3), dec("2.97"));
    }

    #[test]
    fn totals_always_sum() {
        let totals = OrderTotals::new(dec("45.00"), dec("3.60"), dec("5.99"));
        assert_eq!(
            totals.total_amount,
            totals.subtotal + totals.tax_amount + totals.shipping_amount
        );
        assert_eq!(totals.total_amount, dec("54.59"));
    }

    #[test]
    fn formats_two_fraction_digits() {
        assert_eq!(format_usd(dec("45")), "$45.00");
        assert_eq!(format_usd(dec("5.9")), "$5.90");
    }
}
