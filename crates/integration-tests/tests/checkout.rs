//! Checkout-path integration tests: totals, stock accounting, snapshot
//! immutability, and the concurrent oversell race.
//!
//! Run with:
//! ```bash
//! TEST_DATABASE_URL=postgres://localhost/juniper_row_test \
//!     cargo test -p juniper-row-integration-tests -- --ignored
//! ```

use rust_decimal::Decimal;

use juniper_row_core::OrderStatus;
use juniper_row_integration_tests::{TestDb, ZeroPricing, test_checkout};
use juniper_row_storefront::services::checkout::{
    CheckoutError, build_snapshot, place_order, validate_stock,
};

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn checkout_scenario_totals_stock_and_history() {
    let db = TestDb::new().await;
    let user = db.create_user(false).await;
    let product_a = db.create_product("Canvas Tote", "10.00", None, 5).await;
    let product_b = db.create_product("Wool Scarf", "25.00", None, 3).await;
    db.add_cart_line(user, product_a, 2).await;
    db.add_cart_line(user, product_b, 1).await;

    let lines = db.cart_lines(user).await;
    let snapshot = build_snapshot(lines, &ZeroPricing).expect("snapshot");
    validate_stock(&snapshot).expect("stock ok");
    let order_id = place_order(&db.pool, user, &snapshot, &test_checkout())
        .await
        .expect("checkout succeeds");

    // total = 2 * $10.00 + 1 * $25.00 with zero tax/shipping
    let (total, subtotal): (Decimal, Decimal) =
        sqlx::query_as("SELECT total_amount, subtotal FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_one(&db.pool)
            .await
            .expect("order row");
    assert_eq!(total, "45.00".parse().unwrap());
    assert_eq!(subtotal, "45.00".parse().unwrap());

    // stock decremented by exactly the purchased quantities
    assert_eq!(db.stock_of(product_a).await, 3);
    assert_eq!(db.stock_of(product_b).await, 2);

    // cart destroyed in the same commit
    assert!(db.cart_lines(user).await.is_empty());

    // exactly one history row, in pending
    let history = db.history_of(order_id).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].0, OrderStatus::Pending);
    assert_eq!(history[0].1, "Order placed");

    // confirmation + admin alert queued in the outbox
    let outbox = db.outbox_of(order_id).await;
    assert_eq!(outbox, ["order_confirmed", "admin_alert"]);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn empty_cart_checkout_writes_nothing() {
    let db = TestDb::new().await;
    let user = db.create_user(false).await;

    let lines = db.cart_lines(user).await;
    let result = build_snapshot(lines, &ZeroPricing);
    assert!(matches!(result, Err(CheckoutError::EmptyCart)));

    let order_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user)
        .fetch_one(&db.pool)
        .await
        .expect("count");
    assert_eq!(order_count, 0);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn sale_price_is_the_snapshot_price() {
    let db = TestDb::new().await;
    let user = db.create_user(false).await;
    let product = db
        .create_product("Wool Scarf", "32.00", Some("25.00"), 3)
        .await;
    db.add_cart_line(user, product, 1).await;

    let lines = db.cart_lines(user).await;
    assert_eq!(lines[0].unit_price, "25.00".parse().unwrap());

    let snapshot = build_snapshot(lines, &ZeroPricing).expect("snapshot");
    let order_id = place_order(&db.pool, user, &snapshot, &test_checkout())
        .await
        .expect("checkout succeeds");

    let unit_price: Decimal =
        sqlx::query_scalar("SELECT unit_price FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .fetch_one(&db.pool)
            .await
            .expect("order item");
    assert_eq!(unit_price, "25.00".parse().unwrap());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn catalog_price_changes_never_touch_placed_orders() {
    let db = TestDb::new().await;
    let user = db.create_user(false).await;
    let product = db.create_product("Canvas Tote", "10.00", None, 5).await;
    db.add_cart_line(user, product, 2).await;

    let snapshot = build_snapshot(db.cart_lines(user).await, &ZeroPricing).expect("snapshot");
    let order_id = place_order(&db.pool, user, &snapshot, &test_checkout())
        .await
        .expect("checkout succeeds");

    // Reprice the catalog after the fact.
    sqlx::query("UPDATE products SET price = 99.00 WHERE id = $1")
        .bind(product)
        .execute(&db.pool)
        .await
        .expect("reprice");

    let (total, unit_price): (Decimal, Decimal) = sqlx::query_as(
        r"
        SELECT o.total_amount, oi.unit_price
        FROM orders o JOIN order_items oi ON oi.order_id = o.id
        WHERE o.id = $1
        ",
    )
    .bind(order_id)
    .fetch_one(&db.pool)
    .await
    .expect("order");
    assert_eq!(total, "20.00".parse().unwrap());
    assert_eq!(unit_price, "10.00".parse().unwrap());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn precheck_reports_every_short_line() {
    let db = TestDb::new().await;
    let user = db.create_user(false).await;
    let product_a = db.create_product("Canvas Tote", "10.00", None, 1).await;
    let product_b = db.create_product("Wool Scarf", "25.00", None, 0).await;
    db.add_cart_line(user, product_a, 2).await;
    db.add_cart_line(user, product_b, 1).await;

    let snapshot = build_snapshot(db.cart_lines(user).await, &ZeroPricing).expect("snapshot");
    let Err(CheckoutError::InsufficientStock(shortages)) = validate_stock(&snapshot) else {
        panic!("expected insufficient stock");
    };
    assert_eq!(shortages.len(), 2);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn concurrent_checkouts_never_oversell() {
    let db = TestDb::new().await;
    let user_a = db.create_user(false).await;
    let user_b = db.create_user(false).await;
    // Stock 3; both carts want 2; only one can win the contended units.
    let product = db.create_product("Selvedge Jacket", "148.00", None, 3).await;
    db.add_cart_line(user_a, product, 2).await;
    db.add_cart_line(user_b, product, 2).await;

    // Both pre-checks pass against the same point-in-time stock read.
    let snapshot_a = build_snapshot(db.cart_lines(user_a).await, &ZeroPricing).expect("snapshot a");
    let snapshot_b = build_snapshot(db.cart_lines(user_b).await, &ZeroPricing).expect("snapshot b");
    validate_stock(&snapshot_a).expect("precheck a");
    validate_stock(&snapshot_b).expect("precheck b");

    let checkout = test_checkout();
    let (result_a, result_b) = tokio::join!(
        place_order(&db.pool, user_a, &snapshot_a, &checkout),
        place_order(&db.pool, user_b, &snapshot_b, &checkout),
    );

    let successes = [&result_a, &result_b]
        .iter()
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(successes, 1, "exactly one checkout wins the contended stock");

    let loser = if result_a.is_ok() { result_b } else { result_a };
    assert!(matches!(loser, Err(CheckoutError::Oversell { .. })));

    // initial_stock - purchased, never negative
    assert_eq!(db.stock_of(product).await, 1);
}
