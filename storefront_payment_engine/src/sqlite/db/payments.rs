use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewPayment, Order, OrderLocator, PaymentRecord, PaymentStatus};

pub async fn insert_payment(
    order_id: i64,
    payment: &NewPayment,
    conn: &mut SqliteConnection,
) -> Result<PaymentRecord, sqlx::Error> {
    let record = sqlx::query_as(
        r#"
            INSERT INTO payments (
                order_id, rail, status, target_amount, receiving_address, external_ref, descriptor, expires_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(payment.rail)
    .bind(payment.status.to_string())
    .bind(payment.target_amount)
    .bind(&payment.receiving_address)
    .bind(&payment.external_ref)
    .bind(&payment.descriptor)
    .bind(payment.expires_at)
    .fetch_one(conn)
    .await?;
    Ok(record)
}

pub async fn fetch_payment_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRecord>, sqlx::Error> {
    let record =
        sqlx::query_as("SELECT * FROM payments WHERE order_id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(record)
}

/// Resolves a webhook's order reference to its payment record and owning order. Each locator
/// style corresponds to one rail: order numbers for manual lookups, receiving addresses for the
/// wallet-monitored rail, external payment-request ids for the processor rail.
pub async fn fetch_payment_by_locator(
    locator: &OrderLocator,
    conn: &mut SqliteConnection,
) -> Result<Option<(PaymentRecord, Order)>, sqlx::Error> {
    let payment: Option<PaymentRecord> = match locator {
        OrderLocator::Number(number) => {
            sqlx::query_as(
                "SELECT p.* FROM payments p JOIN orders o ON p.order_id = o.id WHERE o.order_number = $1",
            )
            .bind(number)
            .fetch_optional(&mut *conn)
            .await?
        },
        OrderLocator::ReceivingAddress(address) => {
            sqlx::query_as("SELECT * FROM payments WHERE receiving_address = $1")
                .bind(address)
                .fetch_optional(&mut *conn)
                .await?
        },
        OrderLocator::ExternalRef(ext_ref) => {
            sqlx::query_as("SELECT * FROM payments WHERE external_ref = $1")
                .bind(ext_ref)
                .fetch_optional(&mut *conn)
                .await?
        },
    };
    let Some(payment) = payment else { return Ok(None) };
    let order: Option<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(payment.order_id).fetch_optional(&mut *conn).await?;
    Ok(order.map(|o| (payment, o)))
}

/// Writes the cumulative settlement progress from a payment event into the record.
pub async fn update_payment_progress(
    id: i64,
    amount_received: i64,
    confirmations: i64,
    txid: Option<&str>,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<PaymentRecord, sqlx::Error> {
    let record = sqlx::query_as(
        r#"
            UPDATE payments SET
                amount_received = $1,
                confirmations = $2,
                last_txid = COALESCE($3, last_txid),
                status = $4,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $5
            RETURNING *;
        "#,
    )
    .bind(amount_received)
    .bind(confirmations)
    .bind(txid)
    .bind(status.to_string())
    .bind(id)
    .fetch_one(conn)
    .await?;
    Ok(record)
}

pub async fn mark_payment_status(
    id: i64,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<PaymentRecord, sqlx::Error> {
    let record =
        sqlx::query_as("UPDATE payments SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status.to_string())
            .bind(id)
            .fetch_one(conn)
            .await?;
    Ok(record)
}

/// Replaces the payment descriptor on an order wholesale. Used when a buyer retries a payment
/// that never settled; settlement progress is reset because the new descriptor points at a fresh
/// address or payment request.
pub async fn replace_payment(
    order_id: i64,
    payment: &NewPayment,
    conn: &mut SqliteConnection,
) -> Result<PaymentRecord, sqlx::Error> {
    debug!("🗃️ Replacing payment descriptor for order id {order_id} with a new {} request", payment.rail);
    let record = sqlx::query_as(
        r#"
            UPDATE payments SET
                rail = $1,
                status = $2,
                target_amount = $3,
                amount_received = 0,
                confirmations = NULL,
                receiving_address = $4,
                external_ref = $5,
                last_txid = NULL,
                descriptor = $6,
                expires_at = $7,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $8
            RETURNING *;
        "#,
    )
    .bind(payment.rail)
    .bind(payment.status.to_string())
    .bind(payment.target_amount)
    .bind(&payment.receiving_address)
    .bind(&payment.external_ref)
    .bind(&payment.descriptor)
    .bind(payment.expires_at)
    .bind(order_id)
    .fetch_one(conn)
    .await?;
    Ok(record)
}
