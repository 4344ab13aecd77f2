//! Cart repository.
//!
//! Cart lines are the only mutable precursor to an order. The read used
//! by checkout resolves the effective unit price (sale price when set) in
//! the query itself, so the snapshot the caller gets is already priced.

use sqlx::{PgConnection, PgPool};

use juniper_row_core::{CartItemId, CartLine, ProductId, UserId};

use super::RepositoryError;

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a user's cart lines joined with current catalog pricing and
    /// stock, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(
            r"
            SELECT ci.id, ci.product_id, p.name, ci.quantity, ci.size, ci.color,
                   COALESCE(p.sale_price, p.price) AS unit_price,
                   p.stock
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.user_id = $1
            ORDER BY ci.id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    /// Add a product to the cart, merging into an existing line when the
    /// same product/size/color combination is already present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either statement fails
    /// (including a foreign-key failure for an unknown product).
    pub async fn add_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<CartItemId, RepositoryError> {
        let existing: Option<CartItemId> = sqlx::query_scalar(
            r"
            UPDATE cart_items
            SET quantity = quantity + $3, updated_at = NOW()
            WHERE user_id = $1
              AND product_id = $2
              AND size IS NOT DISTINCT FROM $4
              AND color IS NOT DISTINCT FROM $5
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(size)
        .bind(color)
        .fetch_optional(self.pool)
        .await?;

        if let Some(id) = existing {
            return Ok(id);
        }

        let id: CartItemId = sqlx::query_scalar(
            r"
            INSERT INTO cart_items (user_id, product_id, quantity, size, color)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(size)
        .bind(color)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Set the quantity of a cart line owned by the user.
    ///
    /// Returns `true` if a line was updated, `false` if no such line
    /// belongs to the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        cart_item_id: CartItemId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE cart_items
            SET quantity = $1, updated_at = NOW()
            WHERE id = $2 AND user_id = $3
            ",
        )
        .bind(quantity)
        .bind(cart_item_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a cart line owned by the user.
    ///
    /// Returns `true` if a line was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        cart_item_id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM cart_items
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(cart_item_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every cart line owned by the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Number of lines in the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}

/// Remove a user's cart lines inside an open transaction.
///
/// Used by checkout so the cart disappears in the same commit that
/// creates the order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn clear_in_tx(conn: &mut PgConnection, user_id: UserId) -> Result<u64, RepositoryError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}
