//! Single-order lifecycle tests: legal transitions, lifecycle
//! timestamps, illegal-edge no-ops, and tracking updates.

use chrono::{DateTime, Utc};

use juniper_row_admin::services::orders::{OrderUpdate, OrderUpdateError, update_order};
use juniper_row_core::{OrderId, OrderStatus, TransitionError};
use juniper_row_integration_tests::TestDb;

fn status_update(status: OrderStatus, comment: &str) -> OrderUpdate {
    OrderUpdate {
        status: Some(status),
        comment: Some(comment.to_owned()),
        tracking_number: None,
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn full_lifecycle_stamps_timestamps_and_history() {
    let db = TestDb::new().await;
    let admin = db.create_user(true).await;
    let customer = db.create_user(false).await;
    let order = db.create_order(customer, OrderStatus::Pending).await;

    update_order(&db.pool, order, status_update(OrderStatus::Processing, "Picking"), admin)
        .await
        .expect("pending -> processing");
    update_order(&db.pool, order, status_update(OrderStatus::Shipped, "Left warehouse"), admin)
        .await
        .expect("processing -> shipped");
    update_order(&db.pool, order, status_update(OrderStatus::Delivered, "Signed for"), admin)
        .await
        .expect("shipped -> delivered");

    let (status, shipped_at, delivered_at): (
        OrderStatus,
        Option<DateTime<Utc>>,
        Option<DateTime<Utc>>,
    ) = sqlx::query_as("SELECT status, shipped_at, delivered_at FROM orders WHERE id = $1")
        .bind(order)
        .fetch_one(&db.pool)
        .await
        .expect("order row");
    assert_eq!(status, OrderStatus::Delivered);
    assert!(shipped_at.is_some());
    assert!(delivered_at.is_some());

    // one history row per transition, in order
    let history = db.history_of(order).await;
    let statuses: Vec<OrderStatus> = history.iter().map(|(s, _)| *s).collect();
    assert_eq!(
        statuses,
        [
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered
        ]
    );
    assert_eq!(history[1].1, "Left warehouse");

    // one status_changed outbox row per transition
    let outbox = db.outbox_of(order).await;
    assert_eq!(outbox.len(), 3);
    assert!(outbox.iter().all(|e| e == "status_changed"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn illegal_transition_leaves_order_untouched() {
    let db = TestDb::new().await;
    let admin = db.create_user(true).await;
    let customer = db.create_user(false).await;
    let order = db.create_order(customer, OrderStatus::Shipped).await;

    let (_, updated_at_before) = db.order_state(order).await;

    let result = update_order(
        &db.pool,
        order,
        status_update(OrderStatus::Pending, "rewind"),
        admin,
    )
    .await;
    assert!(matches!(
        result,
        Err(OrderUpdateError::Transition(TransitionError::Illegal {
            from: OrderStatus::Shipped,
            to: OrderStatus::Pending,
        }))
    ));

    let (status_after, updated_at_after) = db.order_state(order).await;
    assert_eq!(status_after, OrderStatus::Shipped);
    assert_eq!(updated_at_after, updated_at_before);
    assert!(db.history_of(order).await.is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn terminal_states_reject_every_transition() {
    let db = TestDb::new().await;
    let admin = db.create_user(true).await;
    let customer = db.create_user(false).await;

    for terminal in [OrderStatus::Delivered, OrderStatus::Cancelled] {
        let order = db.create_order(customer, terminal).await;
        for target in OrderStatus::ALL {
            if target == terminal {
                continue;
            }
            let result =
                update_order(&db.pool, order, status_update(target, ""), admin).await;
            assert!(
                matches!(result, Err(OrderUpdateError::Transition(_))),
                "{terminal} -> {target} must be rejected"
            );
        }
        let (status, _) = db.order_state(order).await;
        assert_eq!(status, terminal);
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn same_status_update_is_a_noop_error() {
    let db = TestDb::new().await;
    let admin = db.create_user(true).await;
    let customer = db.create_user(false).await;
    let order = db.create_order(customer, OrderStatus::Pending).await;

    let result = update_order(
        &db.pool,
        order,
        status_update(OrderStatus::Pending, ""),
        admin,
    )
    .await;
    assert!(matches!(
        result,
        Err(OrderUpdateError::Transition(TransitionError::SameStatus(
            OrderStatus::Pending
        )))
    ));
    assert!(db.history_of(order).await.is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn tracking_update_is_independent_of_status() {
    let db = TestDb::new().await;
    let admin = db.create_user(true).await;
    let customer = db.create_user(false).await;
    let order = db.create_order(customer, OrderStatus::Processing).await;

    update_order(
        &db.pool,
        order,
        OrderUpdate {
            status: None,
            comment: None,
            tracking_number: Some("1Z999AA10123456784".to_owned()),
        },
        admin,
    )
    .await
    .expect("tracking update");

    let tracking: Option<String> =
        sqlx::query_scalar("SELECT tracking_number FROM orders WHERE id = $1")
            .bind(order)
            .fetch_one(&db.pool)
            .await
            .expect("order row");
    assert_eq!(tracking.as_deref(), Some("1Z999AA10123456784"));

    // status untouched, but the update is on the audit trail
    let (status, _) = db.order_state(order).await;
    assert_eq!(status, OrderStatus::Processing);
    let history = db.history_of(order).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].0, OrderStatus::Processing);
    assert!(history[0].1.starts_with("Tracking number updated:"));

    // tracking alone must not queue a status notification
    assert!(db.outbox_of(order).await.is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn missing_order_is_not_found() {
    let db = TestDb::new().await;
    let admin = db.create_user(true).await;

    let result = update_order(
        &db.pool,
        OrderId::new(i32::MAX),
        status_update(OrderStatus::Processing, ""),
        admin,
    )
    .await;
    assert!(matches!(result, Err(OrderUpdateError::NotFound)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn empty_update_is_rejected() {
    let db = TestDb::new().await;
    let admin = db.create_user(true).await;
    let customer = db.create_user(false).await;
    let order = db.create_order(customer, OrderStatus::Pending).await;

    let result = update_order(&db.pool, order, OrderUpdate::default(), admin).await;
    assert!(matches!(result, Err(OrderUpdateError::Validation(_))));
}
