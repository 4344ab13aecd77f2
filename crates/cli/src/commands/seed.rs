//! Demo data seeding.
//!
//! Inserts a couple of accounts and a small catalog so a fresh database
//! can exercise the cart/checkout/admin flows immediately. Idempotent:
//! users upsert by email and the catalog is only written when empty.

use rust_decimal::Decimal;

use super::{CommandError, connect};

struct DemoProduct {
    name: &'static str,
    description: &'static str,
    price: &'static str,
    sale_price: Option<&'static str>,
    stock: i32,
}

const DEMO_PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        name: "Linen Overshirt",
        description: "Relaxed-fit overshirt in washed linen.",
        price: "59.00",
        sale_price: None,
        stock: 24,
    },
    DemoProduct {
        name: "Canvas Tote",
        description: "Heavy-duty cotton canvas tote with internal pocket.",
        price: "10.00",
        sale_price: None,
        stock: 5,
    },
    DemoProduct {
        name: "Wool Scarf",
        description: "Merino wool scarf, brushed finish.",
        price: "32.00",
        sale_price: Some("25.00"),
        stock: 3,
    },
    DemoProduct {
        name: "Selvedge Denim Jacket",
        description: "Raw selvedge denim trucker jacket.",
        price: "148.00",
        sale_price: None,
        stock: 12,
    },
];

/// Seed demo users and products.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or an insert
/// fails.
pub async fn run() -> Result<(), CommandError> {
    tracing::info!("Connecting to database...");
    let pool = connect("STOREFRONT_DATABASE_URL").await?;

    tracing::info!("Seeding users...");
    sqlx::query(
        r"
        INSERT INTO users (email, name, is_admin)
        VALUES
            ('customer@example.com', 'Demo Customer', FALSE),
            ('admin@example.com', 'Demo Admin', TRUE)
        ON CONFLICT (email) DO NOTHING
        ",
    )
    .execute(&pool)
    .await?;

    let product_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await?;
    if product_count > 0 {
        tracing::info!(product_count, "Catalog already populated; skipping products");
        return Ok(());
    }

    tracing::info!("Seeding products...");
    for product in DEMO_PRODUCTS {
        let price: Decimal = product.price.parse().unwrap_or_default();
        let sale_price: Option<Decimal> = product.sale_price.map(|p| p.parse().unwrap_or_default());

        sqlx::query(
            r"
            INSERT INTO products (name, description, price, sale_price, stock)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(product.name)
        .bind(product.description)
        .bind(price)
        .bind(sale_price)
        .bind(product.stock)
        .execute(&pool)
        .await?;
    }

    tracing::info!(count = DEMO_PRODUCTS.len(), "Seed complete");
    Ok(())
}
