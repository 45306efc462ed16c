use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewProduct, Product};

pub async fn upsert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (sku, name, price, stock, sellable) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (sku) DO UPDATE SET
                name = excluded.name,
                price = excluded.price,
                stock = excluded.stock,
                sellable = excluded.sellable,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(product.sku)
    .bind(product.name)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.sellable)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

pub async fn fetch_product_by_sku(sku: &str, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE sku = $1").bind(sku).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn fetch_product_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

/// Decrements stock for one product, conditioned on enough stock being available *in the same
/// statement*. Returns `false` when the condition did not hold, i.e. this checkout lost the race
/// (or the product was delisted between validation and here). The caller decides whether that
/// aborts a surrounding transaction.
pub async fn decrement_stock(product_id: i64, quantity: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND sellable = 1 AND stock >= $1
        "#,
    )
    .bind(quantity)
    .bind(product_id)
    .execute(conn)
    .await?;
    let won = result.rows_affected() == 1;
    if !won {
        debug!("🗃️ Conditional stock decrement of {quantity} for product #{product_id} matched no row");
    }
    Ok(won)
}

pub async fn set_stock(product_id: i64, stock: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET stock = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(stock)
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(())
}
