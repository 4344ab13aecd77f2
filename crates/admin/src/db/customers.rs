//! Customer repository for the back office.
//!
//! Customers are storefront users seen through an order-history lens;
//! the back office never edits them here, it only reads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use juniper_row_core::UserId;

use super::RepositoryError;

/// One row in the admin customer list.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CustomerSummary {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub order_count: i64,
    pub total_spent: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Repository for customer reads.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Paginated customer list with order aggregates, newest first.
    ///
    /// `search` matches name or email, case-insensitively, and is bound
    /// as a parameter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: i64,
        per_page: i64,
    ) -> Result<Vec<CustomerSummary>, RepositoryError> {
        let customers = sqlx::query_as::<_, CustomerSummary>(
            r"
            SELECT u.id, u.email, u.name,
                   COUNT(o.id) AS order_count,
                   COALESCE(SUM(o.total_amount), 0) AS total_spent,
                   u.created_at
            FROM users u
            LEFT JOIN orders o ON o.user_id = u.id
            WHERE u.is_admin = FALSE
              AND ($1::text IS NULL
                   OR u.email ILIKE '%' || $1 || '%'
                   OR u.name ILIKE '%' || $1 || '%')
            GROUP BY u.id
            ORDER BY u.created_at DESC, u.id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(search)
        .bind(per_page)
        .bind(page * per_page)
        .fetch_all(self.pool)
        .await?;

        Ok(customers)
    }

    /// One customer with order aggregates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<CustomerSummary>, RepositoryError> {
        let customer = sqlx::query_as::<_, CustomerSummary>(
            r"
            SELECT u.id, u.email, u.name,
                   COUNT(o.id) AS order_count,
                   COALESCE(SUM(o.total_amount), 0) AS total_spent,
                   u.created_at
            FROM users u
            LEFT JOIN orders o ON o.user_id = u.id
            WHERE u.id = $1
            GROUP BY u.id
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(customer)
    }
}
