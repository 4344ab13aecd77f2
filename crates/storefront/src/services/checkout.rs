//! Checkout: cart snapshot, stock validation, and atomic order creation.
//!
//! The flow is snapshot → advisory stock check → one transaction that
//! creates the order, decrements stock through the guarded conditional
//! update, clears the cart, and records history and outbox rows. Any
//! failure inside the transaction rolls the whole thing back; no order,
//! stock change, or cart mutation survives a partial failure.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use juniper_row_core::{
    CartLine, NotificationKind, OrderId, OrderStatus, OrderTotals, PaymentMethod,
    PricingStrategy, ProductId, ShippingDetails, UserId,
};

use crate::db::{RepositoryError, cart, orders, products};

/// Raw checkout form submission.
///
/// Field names match the checkout form inputs. `same_as_billing` is a
/// checkbox: any submitted value means "ship to the billing address".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    pub billing_first_name: Option<String>,
    pub billing_last_name: Option<String>,
    pub billing_email: Option<String>,
    pub billing_address: Option<String>,
    pub billing_city: Option<String>,
    pub billing_state: Option<String>,
    pub billing_postal_code: Option<String>,
    pub billing_country: Option<String>,
    pub same_as_billing: Option<String>,
    pub shipping_first_name: Option<String>,
    pub shipping_last_name: Option<String>,
    pub shipping_address: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_state: Option<String>,
    pub shipping_postal_code: Option<String>,
    pub shipping_country: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

/// A checkout request that passed input validation.
#[derive(Debug, Clone)]
pub struct ValidatedCheckout {
    pub shipping: ShippingDetails,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

/// One cart line the pre-check found short on stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockShortage {
    pub product_id: ProductId,
    pub name: String,
    pub requested: i32,
    pub available: i32,
}

/// Checkout failures.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// The advisory pre-check found lines short on stock. Carries every
    /// offending line, not just the first.
    #[error("insufficient stock for {} line(s)", .0.len())]
    InsufficientStock(Vec<StockShortage>),

    /// The authoritative guard inside the transaction refused a
    /// decrement; a concurrent checkout won the remaining stock.
    #[error("stock for {name} changed during checkout")]
    Oversell { product_id: ProductId, name: String },

    /// The submitted form was incomplete or malformed.
    #[error("{0}")]
    Validation(String),

    /// Persistence failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// The immutable pricing snapshot taken at the top of checkout.
#[derive(Debug, Clone)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub totals: OrderTotals,
}

impl CheckoutRequest {
    /// Validate the submission and resolve the shipping address.
    ///
    /// All problems are collected and reported together, in form order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` listing every missing or
    /// malformed field.
    pub fn validate(&self) -> Result<ValidatedCheckout, CheckoutError> {
        let mut errors = Vec::new();

        let billing = [
            ("billing_first_name", &self.billing_first_name),
            ("billing_last_name", &self.billing_last_name),
            ("billing_email", &self.billing_email),
            ("billing_address", &self.billing_address),
            ("billing_city", &self.billing_city),
            ("billing_state", &self.billing_state),
            ("billing_postal_code", &self.billing_postal_code),
            ("billing_country", &self.billing_country),
        ];
        for (field, value) in billing {
            if trimmed(value).is_none() {
                errors.push(format!("Missing: {field}"));
            }
        }

        if let Some(email) = trimmed(&self.billing_email)
            && !is_valid_email(email)
        {
            errors.push("Invalid email format".to_owned());
        }

        let payment_method = match trimmed(&self.payment_method) {
            Some("credit_card") => Some(PaymentMethod::CreditCard),
            Some("paypal") => Some(PaymentMethod::Paypal),
            Some("cash_on_delivery") => Some(PaymentMethod::CashOnDelivery),
            Some(_) => {
                errors.push("Invalid payment method".to_owned());
                None
            }
            None => {
                errors.push("Missing: payment_method".to_owned());
                None
            }
        };

        let ship_to_billing = trimmed(&self.same_as_billing).is_some();
        if !ship_to_billing {
            let shipping = [
                ("shipping_first_name", &self.shipping_first_name),
                ("shipping_last_name", &self.shipping_last_name),
                ("shipping_address", &self.shipping_address),
                ("shipping_city", &self.shipping_city),
                ("shipping_state", &self.shipping_state),
                ("shipping_postal_code", &self.shipping_postal_code),
                ("shipping_country", &self.shipping_country),
            ];
            for (field, value) in shipping {
                if trimmed(value).is_none() {
                    errors.push(format!("Missing: {field}"));
                }
            }
        }

        if !errors.is_empty() {
            return Err(CheckoutError::Validation(errors.join(", ")));
        }

        let email = trimmed(&self.billing_email).unwrap_or_default().to_owned();
        let shipping = if ship_to_billing {
            ShippingDetails {
                name: full_name(&self.billing_first_name, &self.billing_last_name),
                email,
                address: required(&self.billing_address),
                city: required(&self.billing_city),
                state: required(&self.billing_state),
                zip: required(&self.billing_postal_code),
                country: required(&self.billing_country),
            }
        } else {
            ShippingDetails {
                name: full_name(&self.shipping_first_name, &self.shipping_last_name),
                email,
                address: required(&self.shipping_address),
                city: required(&self.shipping_city),
                state: required(&self.shipping_state),
                zip: required(&self.shipping_postal_code),
                country: required(&self.shipping_country),
            }
        };

        Ok(ValidatedCheckout {
            shipping,
            // Validation errors above guarantee this is Some here.
            payment_method: payment_method.unwrap_or(PaymentMethod::CreditCard),
            notes: trimmed(&self.notes).map(str::to_owned),
        })
    }
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn required(value: &Option<String>) -> String {
    trimmed(value).unwrap_or_default().to_owned()
}

fn full_name(first: &Option<String>, last: &Option<String>) -> String {
    format!(
        "{} {}",
        trimmed(first).unwrap_or_default(),
        trimmed(last).unwrap_or_default()
    )
    .trim()
    .to_owned()
}

/// Structural email check: one `@`, nonempty local part, dotted domain.
fn is_valid_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !s.chars().any(char::is_whitespace)
}

/// Build the immutable pricing snapshot from the user's cart lines.
///
/// Subtotal is the sum of effective-price line totals; tax and shipping
/// come from the configured strategy.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` if there are no lines.
pub fn build_snapshot(
    lines: Vec<CartLine>,
    pricing: &dyn PricingStrategy,
) -> Result<CartSnapshot, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let subtotal = lines.iter().map(CartLine::line_total).sum();
    let totals = OrderTotals::new(subtotal, pricing.tax(subtotal), pricing.shipping(subtotal));

    Ok(CartSnapshot { lines, totals })
}

/// Advisory stock pre-check over the snapshot.
///
/// Collects every offending line so the customer sees all problems at
/// once. This is an early, user-facing rejection only — the guarded
/// decrement inside [`place_order`] is the authoritative guard.
///
/// # Errors
///
/// Returns `CheckoutError::InsufficientStock` listing each short line.
pub fn validate_stock(snapshot: &CartSnapshot) -> Result<(), CheckoutError> {
    let shortages: Vec<StockShortage> = snapshot
        .lines
        .iter()
        .filter(|line| line.stock < line.quantity)
        .map(|line| StockShortage {
            product_id: line.product_id,
            name: line.name.clone(),
            requested: line.quantity,
            available: line.stock.max(0),
        })
        .collect();

    if shortages.is_empty() {
        Ok(())
    } else {
        Err(CheckoutError::InsufficientStock(shortages))
    }
}

/// Atomically convert a validated snapshot into an order.
///
/// Executes as one transaction:
/// 1. insert the order header (status `pending`)
/// 2. insert order lines at the snapshot unit prices
/// 3. guarded stock decrement per line; zero rows affected aborts with
///    `Oversell`
/// 4. clear the user's cart
/// 5. append the initial `pending` history entry (actor = purchaser)
/// 6. append `order_confirmed` and `admin_alert` outbox rows
///
/// Notifications are delivered after commit by the outbox dispatcher, so
/// a delivery failure can never roll back a placed order.
///
/// # Errors
///
/// Returns `CheckoutError::Oversell` when a concurrent checkout took the
/// remaining stock, or `CheckoutError::Repository` on persistence
/// failures. Either way the transaction is fully rolled back.
#[instrument(skip(pool, snapshot, checkout), fields(user_id = %user_id))]
pub async fn place_order(
    pool: &PgPool,
    user_id: UserId,
    snapshot: &CartSnapshot,
    checkout: &ValidatedCheckout,
) -> Result<OrderId, CheckoutError> {
    let mut tx = pool.begin().await?;

    let order_id = orders::insert_order(
        &mut *tx,
        user_id,
        &checkout.shipping,
        &snapshot.totals,
        checkout.payment_method,
        checkout.notes.as_deref(),
    )
    .await?;

    orders::insert_items(&mut *tx, order_id, &snapshot.lines).await?;

    for line in &snapshot.lines {
        let decremented =
            products::decrement_stock_if_available(&mut *tx, line.product_id, line.quantity)
                .await?;
        if !decremented {
            // Dropping the transaction rolls everything back.
            return Err(CheckoutError::Oversell {
                product_id: line.product_id,
                name: line.name.clone(),
            });
        }
    }

    cart::clear_in_tx(&mut *tx, user_id).await?;
    orders::insert_history(&mut *tx, order_id, OrderStatus::Pending, "Order placed", user_id)
        .await?;
    orders::insert_outbox(
        &mut *tx,
        order_id,
        NotificationKind::OrderConfirmed,
        serde_json::json!({}),
    )
    .await?;
    orders::insert_outbox(
        &mut *tx,
        order_id,
        NotificationKind::AdminAlert,
        serde_json::json!({}),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        order_id = %order_id,
        total = %snapshot.totals.total_amount,
        lines = snapshot.lines.len(),
        "Order placed"
    );

    Ok(order_id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use juniper_row_core::CartItemId;
    use rust_decimal::Decimal;

    /// Strategy with fixed outputs for snapshot math tests.
    struct FixedPricing {
        tax: Decimal,
        shipping: Decimal,
    }

    impl PricingStrategy for FixedPricing {
        fn tax(&self, _subtotal: Decimal) -> Decimal {
            self.tax
        }
        fn shipping(&self, _subtotal: Decimal) -> Decimal {
            self.shipping
        }
    }

    fn zero_pricing() -> FixedPricing {
        FixedPricing {
            tax: Decimal::ZERO,
            shipping: Decimal::ZERO,
        }
    }

    fn line(id: i32, product_id: i32, name: &str, qty: i32, price: &str, stock: i32) -> CartLine {
        CartLine {
            id: CartItemId::new(id),
            product_id: ProductId::new(product_id),
            name: name.to_owned(),
            quantity: qty,
            size: None,
            color: None,
            unit_price: price.parse().unwrap(),
            stock,
        }
    }

    fn valid_request() -> CheckoutRequest {
        CheckoutRequest {
            billing_first_name: Some("Ada".to_owned()),
            billing_last_name: Some("Lovelace".to_owned()),
            billing_email: Some("ada@example.com".to_owned()),
            billing_address: Some("1 Analytical Way".to_owned()),
            billing_city: Some("London".to_owned()),
            billing_state: Some("LDN".to_owned()),
            billing_postal_code: Some("EC1A".to_owned()),
            billing_country: Some("GB".to_owned()),
            same_as_billing: Some("on".to_owned()),
            payment_method: Some("credit_card".to_owned()),
            ..CheckoutRequest::default()
        }
    }

    #[test]
    fn snapshot_of_empty_cart_is_rejected() {
        let result = build_snapshot(Vec::new(), &zero_pricing());
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    }

    #[test]
    fn snapshot_totals_sum_line_totals_and_charges() {
        // Cart: 2 x $10.00 + 1 x $25.00, tax and shipping zero -> $45.00.
        let lines = vec![
            line(1, 1, "Canvas tote", 2, "10.00", 5),
            line(2, 2, "Wool scarf", 1, "25.00", 3),
        ];
        let snapshot = build_snapshot(lines, &zero_pricing()).unwrap();
        assert_eq!(snapshot.totals.subtotal, "45.00".parse().unwrap());
        assert_eq!(snapshot.totals.total_amount, "45.00".parse().unwrap());
    }

    #[test]
    fn snapshot_delegates_charges_to_strategy() {
        let pricing = FixedPricing {
            tax: "3.60".parse().unwrap(),
            shipping: "5.99".parse().unwrap(),
        };
        let snapshot = build_snapshot(vec![line(1, 1, "Tote", 2, "10.00", 5)], &pricing).unwrap();
        assert_eq!(snapshot.totals.tax_amount, "3.60".parse().unwrap());
        assert_eq!(snapshot.totals.shipping_amount, "5.99".parse().unwrap());
        assert_eq!(snapshot.totals.total_amount, "29.59".parse().unwrap());
    }

    #[test]
    fn stock_check_collects_every_short_line() {
        let lines = vec![
            line(1, 1, "Tote", 4, "10.00", 2),
            line(2, 2, "Scarf", 1, "25.00", 3),
            line(3, 3, "Belt", 2, "15.00", 0),
        ];
        let snapshot = build_snapshot(lines, &zero_pricing()).unwrap();
        let Err(CheckoutError::InsufficientStock(shortages)) = validate_stock(&snapshot) else {
            panic!("expected insufficient stock");
        };
        assert_eq!(shortages.len(), 2);
        assert_eq!(shortages[0].product_id, ProductId::new(1));
        assert_eq!(shortages[0].available, 2);
        assert_eq!(shortages[1].product_id, ProductId::new(3));
        assert_eq!(shortages[1].available, 0);
    }

    #[test]
    fn stock_check_passes_when_stock_covers_quantities() {
        let lines = vec![line(1, 1, "Tote", 2, "10.00", 2)];
        let snapshot = build_snapshot(lines, &zero_pricing()).unwrap();
        assert!(validate_stock(&snapshot).is_ok());
    }

    #[test]
    fn validation_lists_every_missing_field() {
        let request = CheckoutRequest {
            payment_method: Some("credit_card".to_owned()),
            same_as_billing: Some("on".to_owned()),
            ..CheckoutRequest::default()
        };
        let Err(CheckoutError::Validation(msg)) = request.validate() else {
            panic!("expected validation error");
        };
        assert!(msg.contains("Missing: billing_first_name"));
        assert!(msg.contains("Missing: billing_country"));
    }

    #[test]
    fn validation_rejects_bad_email_and_payment_method() {
        let mut request = valid_request();
        request.billing_email = Some("not-an-email".to_owned());
        request.payment_method = Some("barter".to_owned());
        let Err(CheckoutError::Validation(msg)) = request.validate() else {
            panic!("expected validation error");
        };
        assert!(msg.contains("Invalid email format"));
        assert!(msg.contains("Invalid payment method"));
    }

    #[test]
    fn billing_address_is_reused_when_flag_is_set() {
        let validated = valid_request().validate().unwrap();
        assert_eq!(validated.shipping.name, "Ada Lovelace");
        assert_eq!(validated.shipping.address, "1 Analytical Way");
        assert_eq!(validated.payment_method, PaymentMethod::CreditCard);
    }

    #[test]
    fn separate_shipping_address_is_required_without_flag() {
        let mut request = valid_request();
        request.same_as_billing = None;
        let Err(CheckoutError::Validation(msg)) = request.validate() else {
            panic!("expected validation error");
        };
        assert!(msg.contains("Missing: shipping_address"));

        request.shipping_first_name = Some("Grace".to_owned());
        request.shipping_last_name = Some("Hopper".to_owned());
        request.shipping_address = Some("7 Harbor St".to_owned());
        request.shipping_city = Some("Arlington".to_owned());
        request.shipping_state = Some("VA".to_owned());
        request.shipping_postal_code = Some("22201".to_owned());
        request.shipping_country = Some("US".to_owned());
        let validated = request.validate().unwrap();
        assert_eq!(validated.shipping.name, "Grace Hopper");
        // Billing email still travels with the order.
        assert_eq!(validated.shipping.email, "ada@example.com");
    }

    #[test]
    fn email_structure_check() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("ab.co"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@bco"));
        assert!(!is_valid_email("a@b.co "));
        assert!(!is_valid_email("a@.co"));
    }
}
