//! Order repository (storefront side).
//!
//! The write half is a set of transaction-composable functions over
//! `&mut PgConnection`; checkout strings them together inside one
//! transaction. The read half serves the confirmation page and account
//! order history, always scoped to the owning user.

use serde_json::Value;
use sqlx::{PgConnection, PgPool};

use juniper_row_core::{
    CartLine, NotificationKind, Order, OrderId, OrderItem, OrderStatus, OrderTotals,
    PaymentMethod, ShippingDetails, StatusHistoryEntry, UserId,
};

use super::RepositoryError;

/// Repository for order reads on the storefront.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order by ID, scoped to its owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            SELECT id, user_id, status, subtotal, tax_amount, shipping_amount, total_amount,
                   payment_method, shipping_name, shipping_email, shipping_address,
                   shipping_city, shipping_state, shipping_zip, shipping_country,
                   tracking_number, notes, created_at, updated_at, shipped_at, delivered_at
            FROM orders
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r"
            SELECT id, user_id, status, subtotal, tax_amount, shipping_amount, total_amount,
                   payment_method, shipping_name, shipping_email, shipping_address,
                   shipping_city, shipping_state, shipping_zip, shipping_country,
                   tracking_number, notes, created_at, updated_at, shipped_at, delivered_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Status history for one order, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, StatusHistoryEntry>(
            r"
            SELECT id, order_id, status, comment, actor_id, created_at
            FROM order_status_history
            WHERE order_id = $1
            ORDER BY created_at, id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }

    /// Order lines for one order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT id, order_id, product_id, quantity, unit_price
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }
}

/// Insert the order header with status `pending` and return its ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    user_id: UserId,
    details: &ShippingDetails,
    totals: &OrderTotals,
    payment_method: PaymentMethod,
    notes: Option<&str>,
) -> Result<OrderId, RepositoryError> {
    let id: OrderId = sqlx::query_scalar(
        r"
        INSERT INTO orders (
            user_id, status, subtotal, tax_amount, shipping_amount, total_amount,
            payment_method, shipping_name, shipping_email, shipping_address,
            shipping_city, shipping_state, shipping_zip, shipping_country, notes
        )
        VALUES ($1, 'pending', $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING id
        ",
    )
    .bind(user_id)
    .bind(totals.subtotal)
    .bind(totals.tax_amount)
    .bind(totals.shipping_amount)
    .bind(totals.total_amount)
    .bind(payment_method)
    .bind(&details.name)
    .bind(&details.email)
    .bind(&details.address)
    .bind(&details.city)
    .bind(&details.state)
    .bind(&details.zip)
    .bind(&details.country)
    .bind(notes)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

/// Insert one order line per cart line, copying the snapshot unit price.
///
/// The price deliberately comes from the snapshot, never re-read from the
/// catalog.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any insert fails.
pub async fn insert_items(
    conn: &mut PgConnection,
    order_id: OrderId,
    lines: &[CartLine],
) -> Result<(), RepositoryError> {
    for line in lines {
        sqlx::query(
            r"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(order_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Append a status history entry.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_history(
    conn: &mut PgConnection,
    order_id: OrderId,
    status: OrderStatus,
    comment: &str,
    actor_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO order_status_history (order_id, status, comment, actor_id)
        VALUES ($1, $2, $3, $4)
        ",
    )
    .bind(order_id)
    .bind(status)
    .bind(comment)
    .bind(actor_id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Append a notification outbox row.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_outbox(
    conn: &mut PgConnection,
    order_id: OrderId,
    event: NotificationKind,
    payload: Value,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO notification_outbox (order_id, event, payload)
        VALUES ($1, $2, $3)
        ",
    )
    .bind(order_id)
    .bind(event)
    .bind(payload)
    .execute(conn)
    .await?;

    Ok(())
}
