//! Database migration command.
//!
//! The whole store runs on one database (orders are shared between the
//! storefront and admin binaries); the schema lives in
//! `crates/storefront/migrations/`.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` or `DATABASE_URL` - `PostgreSQL`
//!   connection string

use super::{CommandError, connect};

/// Run database migrations.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a migration
/// fails.
pub async fn run() -> Result<(), CommandError> {
    tracing::info!("Connecting to database...");
    let pool = connect("STOREFRONT_DATABASE_URL").await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
