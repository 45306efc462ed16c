use spg_common::Pence;
use thiserror::Error;

use crate::{
    db_types::{
        CheckoutRequest,
        NewPayment,
        NewRefund,
        Order,
        OrderLocator,
        OrderNumber,
        OrderStatusType,
        PaymentEvent,
        PaymentRecord,
        PaymentStatus,
        RefundEntry,
        ShippingMethod,
    },
    helpers::PricingError,
    order_objects::{CartQuote, PaymentStatusView},
    traits::{data_objects::PaymentEventOutcome, OrderApiError},
};

/// The write side of the commerce backend.
///
/// Every method on this trait is a single atomic unit of work: it commits all of its effects or
/// none of them. Concurrent calls touching the same order or the same product's stock are
/// serialised by the backend, never by the caller.
#[allow(async_fn_in_trait)]
pub trait CommerceDatabase: Clone + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Prices the customer's cart against the live catalog without writing anything.
    ///
    /// This is the read-only prefix of [`checkout`](Self::checkout): same validation, same
    /// numbers. Payment initiation uses it to scope the payment request to the exact total that
    /// checkout will later commit.
    async fn quote_cart(
        &self,
        customer_id: &str,
        method: ShippingMethod,
        country: &str,
        tax: Pence,
        discount: Pence,
    ) -> Result<CartQuote, CommerceError>;

    /// The checkout transaction. In one atomic unit:
    /// * re-reads prices and stock for every cart line and re-validates them,
    /// * decrements stock conditionally (`stock >= requested`), failing the whole checkout if any
    ///   line loses the race,
    /// * persists the order, its items, the payment record and the creation audit entry,
    /// * clears the cart.
    ///
    /// If `request.expected_total` is set and the freshly priced total differs, the checkout
    /// fails before any write. A payment that arrives already settled (the immediate-capture
    /// rail) creates the order in `Processing`; pending crypto payments leave it `Pending`.
    async fn checkout(&self, request: CheckoutRequest, payment: NewPayment) -> Result<Order, CommerceError>;

    /// Folds a normalised payment event into the payment record it locates.
    ///
    /// Idempotent: replaying a delivery, or delivering a count the record has already seen, is a
    /// no-op, as is any event against a payment that has already settled. When the event settles
    /// the payment, the order's payment status and its `Pending → Processing` fulfilment
    /// transition commit in the same transaction as the payment update.
    async fn apply_payment_event(&self, event: PaymentEvent) -> Result<PaymentEventOutcome, CommerceError>;

    /// The buyer-facing payment snapshot for an order, with the payment-window expiry evaluated
    /// (and persisted, if it has lapsed) at read time.
    async fn payment_status(&self, number: &OrderNumber) -> Result<PaymentStatusView, CommerceError>;

    /// Replaces the payment descriptor on an order whose payment never settled (pending, expired
    /// or failed), so the buyer can retry on the same or another rail.
    async fn reissue_payment(&self, number: &OrderNumber, payment: NewPayment) -> Result<PaymentRecord, CommerceError>;

    /// Appends a successful refund to the order's refund ledger.
    ///
    /// The cumulative-refund guard (`total_refunded + amount <= total`) is checked and applied as
    /// one conditional update, so two concurrent refunds can never jointly exceed the order
    /// total. When the refund brings the aggregate to exactly the order total, the order flips to
    /// `FullyRefunded`/`Refunded` in the same transaction.
    async fn record_refund(&self, refund: NewRefund) -> Result<(Order, RefundEntry), CommerceError>;

    /// Records a refund attempt the rail rejected. The entry lands in the ledger with `Failed`
    /// status; the aggregates are untouched.
    async fn record_failed_refund(&self, refund: NewRefund) -> Result<RefundEntry, CommerceError>;

    /// An admin-driven fulfilment status change, validated against the state machine and
    /// recorded in the audit trail.
    async fn update_order_status(
        &self,
        number: &OrderNumber,
        new_status: OrderStatusType,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<Order, CommerceError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), CommerceError> {
        Ok(())
    }
}

use crate::traits::OrderManagement;

#[derive(Debug, Clone, Error)]
pub enum CommerceError {
    #[error("We have an internal database engine problem (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("{0}")]
    PricingError(#[from] PricingError),
    #[error("{0}")]
    QueryError(#[from] OrderApiError),
    #[error("The payment was authorised for {proof}, but the cart prices to {total}")]
    PaymentAmountMismatch { proof: Pence, total: Pence },
    #[error("Insufficient stock for {sku}")]
    StockRaceLost { sku: String },
    #[error("Could not allocate a unique order number after {0} attempts")]
    OrderNumberExhausted(u32),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("No payment matches {0}")]
    PaymentNotFound(OrderLocator),
    #[error("Order {0} has no payment record")]
    PaymentMissingForOrder(OrderNumber),
    #[error("A {0} payment cannot be refunded; only completed payments can")]
    RefundNotEligible(PaymentStatus),
    #[error("Refund of {requested} exceeds the refundable remainder of {refundable}")]
    OverRefund { requested: Pence, refundable: Pence },
    #[error("Refund amounts must be positive (got {0})")]
    NonPositiveRefund(Pence),
    #[error("A refund needs a reason")]
    MissingRefundReason,
    #[error("Fulfilment status cannot change from {from} to {to}")]
    StatusChangeForbidden { from: OrderStatusType, to: OrderStatusType },
    #[error("The order is already {0}")]
    StatusChangeNoOp(OrderStatusType),
    #[error("The payment on this order is {0} and cannot be re-issued")]
    PaymentNotReissuable(PaymentStatus),
}

impl From<sqlx::Error> for CommerceError {
    fn from(e: sqlx::Error) -> Self {
        CommerceError::DatabaseError(e.to_string())
    }
}
