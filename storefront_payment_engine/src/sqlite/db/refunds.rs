use sqlx::SqliteConnection;
use spg_common::Pence;

use crate::db_types::{NewRefund, Order, RefundEntry, RefundEntryStatus};

/// Applies a refund amount to the order's aggregates, guarded by the cumulative-refund invariant.
///
/// The guard (`total_refunded + amount <= total`) is evaluated and applied in one statement, so
/// two refunds racing on the same order cannot both read a stale aggregate and jointly exceed the
/// total; the loser's condition fails and `None` is returned. The derived `refund_status` is
/// recomputed in the same statement.
pub async fn apply_refund_guarded(
    order_id: i64,
    amount: Pence,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                total_refunded = total_refunded + $1,
                refund_status = CASE
                    WHEN total_refunded + $1 = total THEN 'FullyRefunded'
                    ELSE 'PartialRefunded'
                END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND total_refunded + $1 <= total
            RETURNING *;
        "#,
    )
    .bind(amount)
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn insert_refund_entry(
    order_id: i64,
    refund: &NewRefund,
    status: RefundEntryStatus,
    conn: &mut SqliteConnection,
) -> Result<RefundEntry, sqlx::Error> {
    let entry = sqlx::query_as(
        r#"
            INSERT INTO refunds (order_id, amount, reason, actor, status, external_ref)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(refund.amount)
    .bind(&refund.reason)
    .bind(&refund.actor)
    .bind(status.to_string())
    .bind(&refund.external_ref)
    .fetch_one(conn)
    .await?;
    Ok(entry)
}

pub async fn fetch_refunds_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<RefundEntry>, sqlx::Error> {
    let refunds =
        sqlx::query_as("SELECT * FROM refunds WHERE order_id = $1 ORDER BY id ASC").bind(order_id).fetch_all(conn).await?;
    Ok(refunds)
}
