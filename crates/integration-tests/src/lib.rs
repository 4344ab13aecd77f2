//! Integration test harness for Juniper Row.
//!
//! These tests run against a live `PostgreSQL` database and are
//! `#[ignore]`d by default:
//!
//! ```bash
//! # Point at a scratch database and run everything
//! TEST_DATABASE_URL=postgres://localhost/juniper_row_test \
//!     cargo test -p juniper-row-integration-tests -- --ignored
//! ```
//!
//! [`TestDb::new`] connects and applies the schema migrations. Each test
//! creates its own users/products (unique emails via UUID) so tests stay
//! independent and parallel-safe without truncation.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::missing_panics_doc)]

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use juniper_row_core::{
    CartLine, OrderId, OrderStatus, PricingStrategy, ProductId, ShippingDetails, UserId,
};
use juniper_row_storefront::services::checkout::ValidatedCheckout;

/// Strategy that charges no tax and no shipping, for scenarios where the
/// interesting math is the subtotal.
pub struct ZeroPricing;

impl PricingStrategy for ZeroPricing {
    fn tax(&self, _subtotal: Decimal) -> Decimal {
        Decimal::ZERO
    }
    fn shipping(&self, _subtotal: Decimal) -> Decimal {
        Decimal::ZERO
    }
}

/// A connected, migrated test database.
pub struct TestDb {
    pub pool: PgPool,
}

impl TestDb {
    /// Connect using `TEST_DATABASE_URL` (or `DATABASE_URL`) and run the
    /// schema migrations.
    pub async fn new() -> Self {
        let url = std::env::var("TEST_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .expect("set TEST_DATABASE_URL to run integration tests");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .expect("failed to connect to test database");

        sqlx::migrate!("../storefront/migrations")
            .run(&pool)
            .await
            .expect("failed to run migrations");

        Self { pool }
    }

    /// Create a user with a unique email.
    pub async fn create_user(&self, is_admin: bool) -> UserId {
        let email = format!("test-{}@example.com", Uuid::new_v4());
        let name = if is_admin { "Test Admin" } else { "Test Customer" };

        sqlx::query_scalar(
            "INSERT INTO users (email, name, is_admin) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(email)
        .bind(name)
        .bind(is_admin)
        .fetch_one(&self.pool)
        .await
        .expect("failed to create user")
    }

    /// Create a product.
    pub async fn create_product(
        &self,
        name: &str,
        price: &str,
        sale_price: Option<&str>,
        stock: i32,
    ) -> ProductId {
        let price: Decimal = price.parse().unwrap();
        let sale_price: Option<Decimal> = sale_price.map(|p| p.parse().unwrap());

        sqlx::query_scalar(
            r"
            INSERT INTO products (name, price, sale_price, stock)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(name)
        .bind(price)
        .bind(sale_price)
        .bind(stock)
        .fetch_one(&self.pool)
        .await
        .expect("failed to create product")
    }

    /// Put a product in a user's cart.
    pub async fn add_cart_line(&self, user_id: UserId, product_id: ProductId, quantity: i32) {
        sqlx::query("INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(product_id)
            .bind(quantity)
            .execute(&self.pool)
            .await
            .expect("failed to add cart line");
    }

    /// Insert an order directly in a given status (for admin-path tests
    /// that don't need the checkout pipeline).
    pub async fn create_order(&self, user_id: UserId, status: OrderStatus) -> OrderId {
        sqlx::query_scalar(
            r"
            INSERT INTO orders (
                user_id, status, subtotal, tax_amount, shipping_amount, total_amount,
                payment_method, shipping_name, shipping_email, shipping_address,
                shipping_city, shipping_state, shipping_zip, shipping_country
            )
            VALUES ($1, $2, 10.00, 0.00, 0.00, 10.00, 'credit_card',
                    'Test Customer', 'test@example.com', '1 Test St',
                    'Testville', 'TS', '00000', 'US')
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .expect("failed to create order")
    }

    /// Current stock of a product.
    pub async fn stock_of(&self, product_id: ProductId) -> i32 {
        sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_one(&self.pool)
            .await
            .expect("failed to read stock")
    }

    /// Status and `updated_at` of an order.
    pub async fn order_state(&self, order_id: OrderId) -> (OrderStatus, DateTime<Utc>) {
        sqlx::query_as("SELECT status, updated_at FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_one(&self.pool)
            .await
            .expect("failed to read order state")
    }

    /// History rows (status, comment) for an order, oldest first.
    pub async fn history_of(&self, order_id: OrderId) -> Vec<(OrderStatus, String)> {
        sqlx::query_as(
            "SELECT status, comment FROM order_status_history WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .expect("failed to read history")
    }

    /// Outbox event names for an order, oldest first.
    pub async fn outbox_of(&self, order_id: OrderId) -> Vec<String> {
        sqlx::query_scalar(
            "SELECT event::text FROM notification_outbox WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .expect("failed to read outbox")
    }

    /// Cart lines priced through the storefront repository.
    pub async fn cart_lines(&self, user_id: UserId) -> Vec<CartLine> {
        juniper_row_storefront::db::CartRepository::new(&self.pool)
            .lines_for_user(user_id)
            .await
            .expect("failed to load cart lines")
    }
}

/// A validated checkout with plain billing-as-shipping details.
#[must_use]
pub fn test_checkout() -> ValidatedCheckout {
    ValidatedCheckout {
        shipping: ShippingDetails {
            name: "Ada Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
            address: "1 Analytical Way".to_owned(),
            city: "London".to_owned(),
            state: "LDN".to_owned(),
            zip: "EC1A".to_owned(),
            country: "GB".to_owned(),
        },
        payment_method: juniper_row_core::PaymentMethod::CreditCard,
        notes: None,
    }
}
