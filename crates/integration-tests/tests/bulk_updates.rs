//! Bulk operation tests: per-order error isolation, the unified
//! transition table, and the zero-success rollback.

use juniper_row_admin::services::bulk::{
    BulkRequest, MAX_BULK_ORDERS, process_bulk,
};
use juniper_row_admin::services::orders::OrderUpdateError;
use juniper_row_core::{BulkAction, OrderId, OrderStatus};
use juniper_row_integration_tests::TestDb;

fn request(order_ids: Vec<OrderId>, action: BulkAction) -> BulkRequest {
    BulkRequest {
        order_ids,
        action,
        status: None,
        comment: None,
        notify_customers: true,
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn mark_shipped_isolates_per_order_failures() {
    let db = TestDb::new().await;
    let admin = db.create_user(true).await;
    let customer = db.create_user(false).await;

    // Only the processing order is a legal single-step mark_shipped;
    // pending would need to skip a stage and delivered is terminal.
    let processing = db.create_order(customer, OrderStatus::Processing).await;
    let pending = db.create_order(customer, OrderStatus::Pending).await;
    let delivered = db.create_order(customer, OrderStatus::Delivered).await;

    let outcome = process_bulk(
        &db.pool,
        request(vec![processing, pending, delivered], BulkAction::MarkShipped),
        admin,
    )
    .await
    .expect("batch commits with partial success");

    assert_eq!(outcome.success_count, 1);
    assert_eq!(outcome.error_count, 2);
    assert!(outcome.errors.iter().any(|e| e.contains("cannot be marked as shipped")));

    // the valid order committed despite its neighbors failing
    let (status, _) = db.order_state(processing).await;
    assert_eq!(status, OrderStatus::Shipped);
    let (status, _) = db.order_state(pending).await;
    assert_eq!(status, OrderStatus::Pending);
    let (status, _) = db.order_state(delivered).await;
    assert_eq!(status, OrderStatus::Delivered);

    // default bulk comment on the history row
    let history = db.history_of(processing).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].1, "Bulk shipping update");
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn zero_success_batch_persists_nothing() {
    let db = TestDb::new().await;
    let admin = db.create_user(true).await;
    let customer = db.create_user(false).await;

    let delivered_a = db.create_order(customer, OrderStatus::Delivered).await;
    let delivered_b = db.create_order(customer, OrderStatus::Delivered).await;

    let result = process_bulk(
        &db.pool,
        request(vec![delivered_a, delivered_b], BulkAction::MarkProcessing),
        admin,
    )
    .await;

    let Err(OrderUpdateError::Validation(message)) = result else {
        panic!("expected all-failed batch to error");
    };
    assert!(message.starts_with("All operations failed:"));

    // nothing persisted: no history, no outbox rows
    assert!(db.history_of(delivered_a).await.is_empty());
    assert!(db.history_of(delivered_b).await.is_empty());
    assert!(db.outbox_of(delivered_a).await.is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn update_status_applies_full_single_order_rules() {
    let db = TestDb::new().await;
    let admin = db.create_user(true).await;
    let customer = db.create_user(false).await;

    let pending = db.create_order(customer, OrderStatus::Pending).await;
    let already = db.create_order(customer, OrderStatus::Processing).await;

    let outcome = process_bulk(
        &db.pool,
        BulkRequest {
            order_ids: vec![pending, already],
            action: BulkAction::UpdateStatus,
            status: Some(OrderStatus::Processing),
            comment: None,
            notify_customers: false,
        },
        admin,
    )
    .await
    .expect("batch commits");

    assert_eq!(outcome.success_count, 1);
    assert_eq!(outcome.error_count, 1);
    assert!(outcome.errors[0].contains("already has status processing"));

    let (status, _) = db.order_state(pending).await;
    assert_eq!(status, OrderStatus::Processing);
    assert_eq!(db.history_of(pending).await[0].1, "Bulk status update to processing");

    // notify_customers = false suppresses the outbox row
    assert!(db.outbox_of(pending).await.is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn add_comment_appends_history_at_current_status() {
    let db = TestDb::new().await;
    let admin = db.create_user(true).await;
    let customer = db.create_user(false).await;

    let shipped = db.create_order(customer, OrderStatus::Shipped).await;
    let pending = db.create_order(customer, OrderStatus::Pending).await;

    let outcome = process_bulk(
        &db.pool,
        BulkRequest {
            order_ids: vec![shipped, pending],
            action: BulkAction::AddComment,
            status: None,
            comment: Some("Customer called about delivery window".to_owned()),
            notify_customers: true,
        },
        admin,
    )
    .await
    .expect("batch commits");

    assert_eq!(outcome.success_count, 2);
    assert_eq!(outcome.error_count, 0);

    let history = db.history_of(shipped).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].0, OrderStatus::Shipped);
    assert_eq!(history[0].1, "Customer called about delivery window");

    // status unchanged by comments
    let (status, _) = db.order_state(shipped).await;
    assert_eq!(status, OrderStatus::Shipped);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn missing_orders_are_reported_and_skipped() {
    let db = TestDb::new().await;
    let admin = db.create_user(true).await;
    let customer = db.create_user(false).await;

    let pending = db.create_order(customer, OrderStatus::Pending).await;
    let missing = OrderId::new(i32::MAX);

    let outcome = process_bulk(
        &db.pool,
        request(vec![pending, missing], BulkAction::MarkProcessing),
        admin,
    )
    .await
    .expect("batch commits");

    assert_eq!(outcome.success_count, 1);
    assert_eq!(outcome.error_count, 1);
    assert!(outcome.errors[0].contains("not found"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn batch_size_and_empty_batches_are_rejected() {
    let db = TestDb::new().await;
    let admin = db.create_user(true).await;

    let result = process_bulk(&db.pool, request(vec![], BulkAction::MarkProcessing), admin).await;
    assert!(matches!(result, Err(OrderUpdateError::Validation(_))));

    let too_many: Vec<OrderId> = (1..=(MAX_BULK_ORDERS as i32 + 1)).map(OrderId::new).collect();
    let result = process_bulk(
        &db.pool,
        request(too_many, BulkAction::MarkProcessing),
        admin,
    )
    .await;
    let Err(OrderUpdateError::Validation(message)) = result else {
        panic!("expected oversized batch to be rejected");
    };
    assert!(message.contains("Maximum 100 orders"));
}
