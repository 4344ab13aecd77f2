//! The shipped pricing strategy.
//!
//! Checkout only ever talks to the [`PricingStrategy`] trait; this module
//! provides the standard store policy: percentage tax on the subtotal and
//! flat-rate shipping that becomes free above a threshold.

use rust_decimal::Decimal;

use juniper_row_core::PricingStrategy;

use crate::config::PricingConfig;

/// Percentage tax plus flat shipping with a free-shipping threshold.
#[derive(Debug, Clone)]
pub struct StandardPricing {
    tax_rate: Decimal,
    shipping_flat: Decimal,
    free_shipping_threshold: Decimal,
}

impl StandardPricing {
    /// Build the strategy from configuration.
    #[must_use]
    pub const fn new(config: &PricingConfig) -> Self {
        Self {
            tax_rate: config.tax_rate,
            shipping_flat: config.shipping_flat,
            free_shipping_threshold: config.free_shipping_threshold,
        }
    }
}

impl PricingStrategy for StandardPricing {
    fn tax(&self, subtotal: Decimal) -> Decimal {
        (subtotal * self.tax_rate).round_dp(2)
    }

    fn shipping(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.shipping_flat
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pricing() -> StandardPricing {
        StandardPricing::new(&PricingConfig {
            tax_rate: "0.08".parse().unwrap(),
            shipping_flat: "5.99".parse().unwrap(),
            free_shipping_threshold: "50".parse().unwrap(),
        })
    }

    #[test]
    fn tax_is_percentage_of_subtotal_rounded_to_cents() {
        let p = pricing();
        assert_eq!(p.tax("45.00".parse().unwrap()), "3.60".parse().unwrap());
        assert_eq!(p.tax("19.99".parse().unwrap()), "1.60".parse().unwrap());
    }

    #[test]
    fn shipping_is_free_at_and_above_threshold() {
        let p = pricing();
        assert_eq!(p.shipping("50.00".parse().unwrap()), Decimal::ZERO);
        assert_eq!(p.shipping("120.00".parse().unwrap()), Decimal::ZERO);
    }

    #[test]
    fn shipping_is_flat_below_threshold() {
        let p = pricing();
        assert_eq!(p.shipping("49.99".parse().unwrap()), "5.99".parse().unwrap());
    }
}
