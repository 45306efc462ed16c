use sqlx::SqliteConnection;

use crate::db_types::{CartItem, Product};

/// Fetches the customer's cart lines, each paired with the live catalog row for its product.
/// Run inside the checkout transaction this gives the price/stock snapshot the whole checkout is
/// validated against.
pub async fn fetch_cart_with_products(
    customer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<(CartItem, Product)>, sqlx::Error> {
    let items: Vec<CartItem> =
        sqlx::query_as("SELECT * FROM cart_items WHERE customer_id = $1 ORDER BY created_at ASC")
            .bind(customer_id)
            .fetch_all(&mut *conn)
            .await?;
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        let product: Product =
            sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(item.product_id).fetch_one(&mut *conn).await?;
        result.push((item, product));
    }
    Ok(result)
}

pub async fn upsert_cart_item(
    customer_id: &str,
    product_id: i64,
    quantity: i64,
    cached_price: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO cart_items (customer_id, product_id, quantity, cached_price) VALUES ($1, $2, $3, $4)
            ON CONFLICT (customer_id, product_id) DO UPDATE SET
                quantity = excluded.quantity,
                cached_price = excluded.cached_price,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(customer_id)
    .bind(product_id)
    .bind(quantity)
    .bind(cached_price)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn clear_cart(customer_id: &str, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE customer_id = $1").bind(customer_id).execute(conn).await?;
    Ok(result.rows_affected())
}
