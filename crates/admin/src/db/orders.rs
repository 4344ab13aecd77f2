//! Order repository (admin side).
//!
//! Reads serve the order list and detail screens; the transaction-scoped
//! writes are composed by the status services into single commits. List
//! filters are fully parameterized — filter values are only ever bound,
//! never spliced into SQL.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use juniper_row_core::{
    NotificationKind, Order, OrderId, OrderStatus, ProductId, UserId,
};

use super::RepositoryError;

/// One row in the admin order list.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_email: String,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub shipping_name: String,
    pub tracking_number: Option<String>,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// One order line joined with its product name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItemDetail {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// One history entry joined with the actor's name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct HistoryEntryDetail {
    pub status: OrderStatus,
    pub comment: String,
    pub actor_id: UserId,
    pub actor_name: String,
    pub created_at: DateTime<Utc>,
}

/// Typed filters for the admin order list.
#[derive(Debug, Clone, Default)]
pub struct OrderListFilters {
    /// Restrict to one status.
    pub status: Option<OrderStatus>,
    /// Case-insensitive match over shipping name/email and account email.
    pub search: Option<String>,
    /// Exact order id (e.g. from a pasted order number).
    pub id_search: Option<OrderId>,
    /// Orders created at or after this instant.
    pub created_from: Option<DateTime<Utc>>,
    /// Orders created strictly before this instant.
    pub created_before: Option<DateTime<Utc>>,
    /// Zero-based page.
    pub page: i64,
    /// Page size.
    pub per_page: i64,
}

const LIST_WHERE: &str = r"
    WHERE ($1::order_status IS NULL OR o.status = $1)
      AND ($2::text IS NULL
           OR o.shipping_name ILIKE '%' || $2 || '%'
           OR o.shipping_email ILIKE '%' || $2 || '%'
           OR u.email ILIKE '%' || $2 || '%'
           OR o.id = COALESCE($3::int, -1))
      AND ($4::timestamptz IS NULL OR o.created_at >= $4)
      AND ($5::timestamptz IS NULL OR o.created_at < $5)
";

/// Repository for admin order operations.
pub struct OrderAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderAdminRepository<'a> {
    /// Create a new admin order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            SELECT id, user_id, status, subtotal, tax_amount, shipping_amount, total_amount,
                   payment_method, shipping_name, shipping_email, shipping_address,
                   shipping_city, shipping_state, shipping_zip, shipping_country,
                   tracking_number, notes, created_at, updated_at, shipped_at, delivered_at
            FROM orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Filtered, paginated order list plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list(
        &self,
        filters: &OrderListFilters,
    ) -> Result<(Vec<OrderSummary>, i64), RepositoryError> {
        let list_sql = format!(
            r"
            SELECT o.id, o.user_id, u.email AS user_email, o.status, o.total_amount,
                   o.shipping_name, o.tracking_number,
                   (SELECT COUNT(*) FROM order_items oi WHERE oi.order_id = o.id) AS item_count,
                   o.created_at
            FROM orders o
            JOIN users u ON u.id = o.user_id
            {LIST_WHERE}
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $6 OFFSET $7
            "
        );

        let orders = sqlx::query_as::<_, OrderSummary>(&list_sql)
            .bind(filters.status)
            .bind(filters.search.as_deref())
            .bind(filters.id_search)
            .bind(filters.created_from)
            .bind(filters.created_before)
            .bind(filters.per_page)
            .bind(filters.page * filters.per_page)
            .fetch_all(self.pool)
            .await?;

        let count_sql = format!(
            r"
            SELECT COUNT(*)
            FROM orders o
            JOIN users u ON u.id = o.user_id
            {LIST_WHERE}
            "
        );

        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filters.status)
            .bind(filters.search.as_deref())
            .bind(filters.id_search)
            .bind(filters.created_from)
            .bind(filters.created_before)
            .fetch_one(self.pool)
            .await?;

        Ok((orders, total))
    }

    /// Orders belonging to one customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderSummary>(
            r"
            SELECT o.id, o.user_id, u.email AS user_email, o.status, o.total_amount,
                   o.shipping_name, o.tracking_number,
                   (SELECT COUNT(*) FROM order_items oi WHERE oi.order_id = o.id) AS item_count,
                   o.created_at
            FROM orders o
            JOIN users u ON u.id = o.user_id
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC, o.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Order lines with product names for the detail screen.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItemDetail>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItemDetail>(
            r"
            SELECT oi.product_id, p.name AS product_name, oi.quantity, oi.unit_price
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Full status history with actor names, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<HistoryEntryDetail>, RepositoryError> {
        let entries = sqlx::query_as::<_, HistoryEntryDetail>(
            r"
            SELECT h.status, h.comment, h.actor_id, u.name AS actor_name, h.created_at
            FROM order_status_history h
            JOIN users u ON u.id = h.actor_id
            WHERE h.order_id = $1
            ORDER BY h.created_at, h.id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }
}

/// Load an order and lock its row for the rest of the transaction.
///
/// Concurrent admin actions on the same order serialize here instead of
/// interleaving their status writes.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_for_update(
    conn: &mut PgConnection,
    id: OrderId,
) -> Result<Option<Order>, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(
        r"
        SELECT id, user_id, status, subtotal, tax_amount, shipping_amount, total_amount,
               payment_method, shipping_name, shipping_email, shipping_address,
               shipping_city, shipping_state, shipping_zip, shipping_country,
               tracking_number, notes, created_at, updated_at, shipped_at, delivered_at
        FROM orders
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(order)
}

/// Apply a validated status change in one UPDATE, stamping `updated_at`
/// and the `shipped_at`/`delivered_at` lifecycle timestamps when the
/// order enters those states.
///
/// Returns `true` when exactly one row was updated.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn apply_status(
    conn: &mut PgConnection,
    id: OrderId,
    new_status: OrderStatus,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE orders
        SET status = $2,
            updated_at = NOW(),
            shipped_at = CASE WHEN $2 = 'shipped'::order_status THEN NOW() ELSE shipped_at END,
            delivered_at = CASE WHEN $2 = 'delivered'::order_status THEN NOW() ELSE delivered_at END
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(new_status)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Set the tracking number.
///
/// Returns `true` when exactly one row was updated.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn set_tracking(
    conn: &mut PgConnection,
    id: OrderId,
    tracking_number: &str,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE orders
        SET tracking_number = $2, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(tracking_number)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
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
    payload: serde_json::Value,
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
