//! `SqliteDatabase` is a concrete implementation of the storefront commerce backend.
//!
//! It implements all the traits defined in the [`crate::traits`] module on top of SQLite. The
//! atomicity discipline is uniform: every trait method that writes opens one transaction, calls
//! through to the plain functions in [`super::db`], and commits at the end. Dropping the
//! transaction on the error path rolls everything back, so a checkout that fails on its third
//! cart line leaves the first two lines' stock untouched.
use std::fmt::Debug;

use chrono::Utc;
use log::*;
use spg_common::Pence;
use sqlx::SqlitePool;

use super::db::{carts, exchange_rates, new_pool, orders, payments, products, refunds};
use crate::{
    api::exchange_objects::ExchangeRate,
    db_types::{
        CartItem,
        CheckoutRequest,
        NewOrder,
        NewPayment,
        NewProduct,
        NewRefund,
        Order,
        OrderNumber,
        OrderStatusType,
        PaymentEvent,
        PaymentEventKind,
        PaymentRecord,
        PaymentStatus,
        Product,
        RefundEntry,
        RefundEntryStatus,
        RefundStatus,
        ShippingMethod,
    },
    helpers::{derive_payment_status, new_order_number, price_cart},
    order_objects::{CartQuote, FullOrder, OrderQueryFilter, PaymentStatusView},
    traits::{
        CommerceDatabase,
        CommerceError,
        ExchangeRateError,
        ExchangeRates,
        OrderApiError,
        OrderManagement,
        PaymentEventOutcome,
    },
};

/// How many fresh order numbers to try before giving up on a UNIQUE collision streak.
const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 5;

const CHECKOUT_ACTOR: &str = "system:checkout";
const RECONCILIATION_ACTOR: &str = "system:reconciliation";

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new connection pool for the given URL.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates or updates a catalog entry. The catalog itself is maintained elsewhere; this
    /// exists for seeding and for the storefront's sync job.
    pub async fn upsert_product(&self, product: NewProduct) -> Result<Product, CommerceError> {
        let mut tx = self.pool.begin().await?;
        let product = products::upsert_product(product, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    /// Puts (or replaces) a line in a customer's cart. Cart maintenance is the storefront's job;
    /// this exists for seeding and tests.
    pub async fn add_to_cart(
        &self,
        customer_id: &str,
        product: &Product,
        quantity: i64,
    ) -> Result<CartItem, CommerceError> {
        let mut tx = self.pool.begin().await?;
        let item = carts::upsert_cart_item(customer_id, product.id, quantity, product.price.value(), &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    /// If the payment window on a live payment has lapsed, persist `Expired` on the payment and
    /// the order. Called from every status read so that buyers polling an abandoned order see
    /// `Expired` without any background timer or fresh webhook.
    async fn expire_if_lapsed(
        &self,
        order: Order,
        payment: PaymentRecord,
    ) -> Result<(Order, PaymentRecord), CommerceError> {
        let lapsed = payment.status.is_live() && payment.expires_at.map(|t| Utc::now() > t).unwrap_or(false);
        if !lapsed {
            return Ok((order, payment));
        }
        info!("⏱️ Payment window for order {} lapsed. Marking it expired", order.order_number);
        let mut tx = self.pool.begin().await?;
        let payment = payments::mark_payment_status(payment.id, PaymentStatus::Expired, &mut tx).await?;
        let order = orders::update_order_payment_status(order.id, PaymentStatus::Expired, &mut tx).await?;
        tx.commit().await?;
        Ok((order, payment))
    }
}

impl CommerceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn quote_cart(
        &self,
        customer_id: &str,
        method: ShippingMethod,
        country: &str,
        tax: Pence,
        discount: Pence,
    ) -> Result<CartQuote, CommerceError> {
        let mut conn = self.pool.acquire().await?;
        let cart = carts::fetch_cart_with_products(customer_id, &mut conn).await?;
        let quote = price_cart(&cart, method, country, tax, discount)?;
        Ok(quote)
    }

    async fn checkout(&self, request: CheckoutRequest, payment: NewPayment) -> Result<Order, CommerceError> {
        let mut tx = self.pool.begin().await?;
        let cart = carts::fetch_cart_with_products(&request.customer_id, &mut tx).await?;
        let quote = price_cart(&cart, request.shipping_method, &request.address.country, request.tax, request.discount)?;
        if let Some(proof) = request.expected_total {
            if proof != quote.total {
                return Err(CommerceError::PaymentAmountMismatch { proof, total: quote.total });
            }
        }
        // A payment that was captured before checkout must have been captured for this exact
        // total; a stale client total is a hard failure, not a rounding concern.
        if payment.status == PaymentStatus::Completed && payment.target_amount != quote.total.value() {
            return Err(CommerceError::PaymentAmountMismatch {
                proof: Pence::from(payment.target_amount),
                total: quote.total,
            });
        }
        for line in &quote.lines {
            let won = products::decrement_stock(line.product_id, line.quantity, &mut tx).await?;
            if !won {
                warn!("🛒️ Checkout for {} lost the stock race on {}. Rolling back", request.customer_id, line.sku);
                return Err(CommerceError::StockRaceLost { sku: line.sku.clone() });
            }
        }
        let mut attempts = 0;
        let order = loop {
            let new_order = NewOrder {
                order_number: new_order_number(),
                customer_id: request.customer_id.clone(),
                email: request.email.clone(),
                address: request.address.clone(),
                shipping_method: request.shipping_method,
                subtotal: quote.subtotal,
                shipping: quote.shipping,
                tax: quote.tax,
                discount: quote.discount,
                total: quote.total,
            };
            match orders::try_insert_order(&new_order, &mut tx).await? {
                Some(order) => break order,
                None => {
                    attempts += 1;
                    if attempts >= MAX_ORDER_NUMBER_ATTEMPTS {
                        return Err(CommerceError::OrderNumberExhausted(MAX_ORDER_NUMBER_ATTEMPTS));
                    }
                },
            }
        };
        orders::insert_order_items(order.id, &quote.lines, &mut tx).await?;
        payments::insert_payment(order.id, &payment, &mut tx).await?;
        orders::insert_status_history(order.id, None, OrderStatusType::Pending, CHECKOUT_ACTOR, None, &mut tx).await?;
        // A payment that arrives already settled (immediate capture) moves the order straight to
        // Processing in the same transaction.
        let order = if payment.status == PaymentStatus::Completed {
            orders::update_order_payment_status(order.id, PaymentStatus::Completed, &mut tx).await?;
            let order = orders::update_order_status(order.id, OrderStatusType::Processing, &mut tx).await?;
            orders::insert_status_history(
                order.id,
                Some(OrderStatusType::Pending),
                OrderStatusType::Processing,
                CHECKOUT_ACTOR,
                Some("payment captured"),
                &mut tx,
            )
            .await?;
            order
        } else {
            order
        };
        let cleared = carts::clear_cart(&request.customer_id, &mut tx).await?;
        tx.commit().await?;
        info!(
            "🛒️ Order {} created for {} ({} lines, {} total, {} cart lines cleared)",
            order.order_number,
            order.customer_id,
            quote.lines.len(),
            order.total,
            cleared
        );
        Ok(order)
    }

    async fn apply_payment_event(&self, event: PaymentEvent) -> Result<PaymentEventOutcome, CommerceError> {
        if let PaymentEventKind::Unrecognized(kind) = &event.kind {
            info!("🔄️ Ignoring unrecognised payment event kind '{kind}' for {}", event.locator);
            return Ok(PaymentEventOutcome::Ignored(kind.clone()));
        }
        let mut tx = self.pool.begin().await?;
        let Some((payment, order)) = payments::fetch_payment_by_locator(&event.locator, &mut tx).await? else {
            warn!("🔄️ Payment event for {} matches no payment record", event.locator);
            return Ok(PaymentEventOutcome::UnknownOrder(event.locator));
        };
        if matches!(payment.status, PaymentStatus::Completed | PaymentStatus::Refunded) {
            debug!("🔄️ Payment for {} already settled. Acknowledging without side effects", order.order_number);
            return Ok(PaymentEventOutcome::AlreadySettled(order));
        }
        // Monotonic: an event is only new information if it advances the confirmation count or
        // the amount seen. Redeliveries and out-of-order deliveries land here.
        if let Some(seen) = payment.confirmations {
            if event.confirmations <= seen && event.amount <= payment.amount_received {
                debug!(
                    "🔄️ Stale delivery for {} (event confirmations {}, recorded {})",
                    order.order_number, event.confirmations, seen
                );
                return Ok(PaymentEventOutcome::Stale(order));
            }
        }
        let amount = event.amount.max(payment.amount_received);
        let confirmations = event.confirmations.max(payment.confirmations.unwrap_or(0));
        let lapsed = payment.expires_at.map(|t| Utc::now() > t).unwrap_or(false);
        let status =
            derive_payment_status(event.processor_status, payment.target_amount, amount, confirmations, lapsed);
        payments::update_payment_progress(payment.id, amount, confirmations, event.txid.as_deref(), status, &mut tx)
            .await?;
        let order = orders::update_order_payment_status(order.id, status, &mut tx).await?;
        let settled = status == PaymentStatus::Completed;
        let order = if settled && order.status == OrderStatusType::Pending {
            let order = orders::update_order_status(order.id, OrderStatusType::Processing, &mut tx).await?;
            let reason = event.txid.as_deref().map(|txid| format!("payment settled in {txid}"));
            orders::insert_status_history(
                order.id,
                Some(OrderStatusType::Pending),
                OrderStatusType::Processing,
                RECONCILIATION_ACTOR,
                reason.as_deref(),
                &mut tx,
            )
            .await?;
            order
        } else {
            order
        };
        tx.commit().await?;
        debug!(
            "🔄️ {} event applied to {}: {}/{} {} at {} confirmations → {status}",
            event.rail,
            order.order_number,
            amount,
            payment.target_amount,
            event.rail.atomic_unit(),
            confirmations
        );
        Ok(PaymentEventOutcome::Applied { order, settled })
    }

    async fn payment_status(&self, number: &OrderNumber) -> Result<PaymentStatusView, CommerceError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(number.clone()))?;
        let payment = payments::fetch_payment_for_order(order.id, &mut conn)
            .await?
            .ok_or_else(|| CommerceError::PaymentMissingForOrder(number.clone()))?;
        drop(conn);
        let (order, payment) = self.expire_if_lapsed(order, payment).await?;
        Ok(PaymentStatusView {
            order_number: order.order_number.0,
            rail: payment.rail,
            payment_status: payment.status,
            confirmations: payment.confirmations,
            amount_received: payment.amount_received,
            target_amount: payment.target_amount,
            is_expired: payment.status == PaymentStatus::Expired,
            expires_at: payment.expires_at,
        })
    }

    async fn reissue_payment(&self, number: &OrderNumber, payment: NewPayment) -> Result<PaymentRecord, CommerceError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_number(number, &mut tx)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(number.clone()))?;
        let existing = payments::fetch_payment_for_order(order.id, &mut tx)
            .await?
            .ok_or_else(|| CommerceError::PaymentMissingForOrder(number.clone()))?;
        if !existing.status.is_reissuable() {
            return Err(CommerceError::PaymentNotReissuable(existing.status));
        }
        let record = payments::replace_payment(order.id, &payment, &mut tx).await?;
        orders::update_order_payment_status(order.id, payment.status, &mut tx).await?;
        tx.commit().await?;
        info!("💳️ Re-issued {} payment descriptor for order {}", record.rail, number);
        Ok(record)
    }

    async fn record_refund(&self, refund: NewRefund) -> Result<(Order, RefundEntry), CommerceError> {
        if refund.amount <= Pence::from(0) {
            return Err(CommerceError::NonPositiveRefund(refund.amount));
        }
        if refund.reason.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err(CommerceError::MissingRefundReason);
        }
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_number(&refund.order_number, &mut tx)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(refund.order_number.clone()))?;
        if order.payment_status != PaymentStatus::Completed {
            return Err(CommerceError::RefundNotEligible(order.payment_status));
        }
        let Some(order) = refunds::apply_refund_guarded(order.id, refund.amount, &mut tx).await? else {
            // The conditional update re-reads the aggregate inside the transaction, so this also
            // catches a concurrent refund that landed after our fetch above.
            return Err(CommerceError::OverRefund {
                requested: refund.amount,
                refundable: order.refundable_remainder(),
            });
        };
        let entry = refunds::insert_refund_entry(order.id, &refund, RefundEntryStatus::Succeeded, &mut tx).await?;
        let order = if order.refund_status == RefundStatus::FullyRefunded {
            let payment = payments::fetch_payment_for_order(order.id, &mut tx)
                .await?
                .ok_or_else(|| CommerceError::PaymentMissingForOrder(refund.order_number.clone()))?;
            payments::mark_payment_status(payment.id, PaymentStatus::Refunded, &mut tx).await?;
            orders::update_order_payment_status(order.id, PaymentStatus::Refunded, &mut tx).await?;
            let old_status = order.status;
            let order = orders::update_order_status(order.id, OrderStatusType::Refunded, &mut tx).await?;
            orders::insert_status_history(
                order.id,
                Some(old_status),
                OrderStatusType::Refunded,
                &refund.actor,
                refund.reason.as_deref(),
                &mut tx,
            )
            .await?;
            order
        } else {
            order
        };
        tx.commit().await?;
        info!(
            "🧾️ Refund of {} recorded against {} by {}. {} of {} now refunded",
            refund.amount, order.order_number, refund.actor, order.total_refunded, order.total
        );
        Ok((order, entry))
    }

    async fn record_failed_refund(&self, refund: NewRefund) -> Result<RefundEntry, CommerceError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_number(&refund.order_number, &mut tx)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(refund.order_number.clone()))?;
        let entry = refunds::insert_refund_entry(order.id, &refund, RefundEntryStatus::Failed, &mut tx).await?;
        tx.commit().await?;
        warn!("🧾️ Rail rejected refund of {} against {}. Attempt logged", refund.amount, order.order_number);
        Ok(entry)
    }

    async fn update_order_status(
        &self,
        number: &OrderNumber,
        new_status: OrderStatusType,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<Order, CommerceError> {
        use OrderStatusType::*;
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_number(number, &mut tx)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(number.clone()))?;
        let old_status = order.status;
        // Pending → Processing belongs to the payment flow, and Refunded is only ever reached
        // through the refund ledger. Everything else an admin may drive, forwards only.
        match (old_status, new_status) {
            (old, new) if old == new => return Err(CommerceError::StatusChangeNoOp(old)),
            (Processing, Shipped) | (Shipped, Delivered) => {},
            (Pending | Processing, Cancelled) => {},
            (from, to) => return Err(CommerceError::StatusChangeForbidden { from, to }),
        }
        let order = orders::update_order_status(order.id, new_status, &mut tx).await?;
        orders::insert_status_history(order.id, Some(old_status), new_status, actor, reason, &mut tx).await?;
        tx.commit().await?;
        info!("📦️ Order {} moved {} → {} by {}", order.order_number, old_status, new_status, actor);
        Ok(order)
    }

    async fn close(&mut self) -> Result<(), CommerceError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_full_order(&self, number: &OrderNumber) -> Result<Option<FullOrder>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let Some(order) = orders::fetch_order_by_number(number, &mut conn).await? else { return Ok(None) };
        let items = orders::fetch_items_for_order(order.id, &mut conn).await?;
        let payment = payments::fetch_payment_for_order(order.id, &mut conn).await?;
        let history = orders::fetch_history_for_order(order.id, &mut conn).await?;
        let refunds = refunds::fetch_refunds_for_order(order.id, &mut conn).await?;
        Ok(Some(FullOrder { order, items, payment, refunds, history }))
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_cart(&self, customer_id: &str) -> Result<Vec<(CartItem, Product)>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let cart = carts::fetch_cart_with_products(customer_id, &mut conn).await?;
        Ok(cart)
    }

    async fn fetch_product_by_sku(&self, sku: &str) -> Result<Option<Product>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product_by_sku(sku, &mut conn).await?;
        Ok(product)
    }
}

impl ExchangeRates for SqliteDatabase {
    async fn fetch_last_rate(&self, currency: &str) -> Result<ExchangeRate, ExchangeRateError> {
        let mut conn =
            self.pool.acquire().await.map_err(|e| ExchangeRateError::DatabaseError(e.to_string()))?;
        exchange_rates::fetch_last_rate(currency, &mut conn).await
    }

    async fn set_exchange_rate(&self, rate: &ExchangeRate) -> Result<(), ExchangeRateError> {
        let mut conn =
            self.pool.acquire().await.map_err(|e| ExchangeRateError::DatabaseError(e.to_string()))?;
        exchange_rates::set_exchange_rate(rate, &mut conn).await
    }
}
