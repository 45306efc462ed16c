use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderItem, OrderNumber, OrderStatusType, PaymentStatus, StatusHistoryEntry},
    order_objects::{OrderQueryFilter, PricedLine},
    traits::CommerceError,
};

/// Inserts a new order row. Returns `Ok(None)` if the order number is already taken, so the
/// caller can generate a fresh number and try again; uniqueness is enforced by the database, not
/// by the generator.
pub async fn try_insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Option<Order>, CommerceError> {
    let result: Result<Order, sqlx::Error> = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number, customer_id, email,
                recipient, address_line1, address_line2, city, postcode, country,
                shipping_method, subtotal, shipping, tax, discount, total
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *;
        "#,
    )
    .bind(&order.order_number)
    .bind(&order.customer_id)
    .bind(&order.email)
    .bind(&order.address.recipient)
    .bind(&order.address.line1)
    .bind(&order.address.line2)
    .bind(&order.address.city)
    .bind(&order.address.postcode)
    .bind(&order.address.country)
    .bind(order.shipping_method.to_string())
    .bind(order.subtotal)
    .bind(order.shipping)
    .bind(order.tax)
    .bind(order.discount)
    .bind(order.total)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => {
            debug!("🗃️ Order {} inserted with id {}", order.order_number, order.id);
            Ok(Some(order))
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            debug!("🗃️ Order number {} collided. Retrying with a fresh one", order.order_number);
            Ok(None)
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn insert_order_items(
    order_id: i64,
    lines: &[PricedLine],
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    for line in lines {
        sqlx::query(
            r#"
                INSERT INTO order_items (order_id, product_id, sku, name, quantity, unit_price, line_total)
                VALUES ($1, $2, $3, $4, $5, $6, $7);
            "#,
        )
        .bind(order_id)
        .bind(line.product_id)
        .bind(&line.sku)
        .bind(&line.name)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.line_total)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_number = $1").bind(number).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_items_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are ordered by `created_at` in ascending order.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(number) = query.order_number {
        where_clause.push("order_number = ");
        where_clause.push_bind_unseparated(number);
    }
    if let Some(cid) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(cid);
    }
    if let Some(rail) = query.rail {
        where_clause.push("id IN (SELECT order_id FROM payments WHERE rail = ");
        where_clause.push_bind_unseparated(rail);
        where_clause.push_unseparated(")");
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let statuses =
            query.status.as_ref().unwrap().iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
        where_clause.push(format!("status IN ({statuses})"));
    }
    if query.payment_status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let statuses =
            query.payment_status.as_ref().unwrap().iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
        where_clause.push(format!("payment_status IN ({statuses})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Order>();
    let orders = query.fetch_all(conn).await?;
    trace!("🗃️ search_orders matched {} orders", orders.len());
    Ok(orders)
}

pub async fn update_order_status(
    id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, CommerceError> {
    let result: Option<Order> =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status.to_string())
            .bind(id)
            .fetch_optional(conn)
            .await?;
    result.ok_or_else(|| CommerceError::DatabaseError(format!("Order with id {id} vanished mid-transaction")))
}

pub async fn update_order_payment_status(
    id: i64,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, CommerceError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET payment_status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(status.to_string())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    result.ok_or_else(|| CommerceError::DatabaseError(format!("Order with id {id} vanished mid-transaction")))
}

pub async fn insert_status_history(
    order_id: i64,
    old_status: Option<OrderStatusType>,
    new_status: OrderStatusType,
    actor: &str,
    reason: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO order_status_history (order_id, old_status, new_status, actor, reason)
            VALUES ($1, $2, $3, $4, $5);
        "#,
    )
    .bind(order_id)
    .bind(old_status.map(|s| s.to_string()))
    .bind(new_status.to_string())
    .bind(actor)
    .bind(reason)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_history_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<StatusHistoryEntry>, sqlx::Error> {
    let history = sqlx::query_as("SELECT * FROM order_status_history WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(history)
}
