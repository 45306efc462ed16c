use std::fmt::Debug;

use log::*;
use spg_common::Pence;

use crate::{
    db_types::{CheckoutRequest, NewPayment, Order, OrderNumber, OrderStatusType, PaymentEvent, PaymentRecord, ShippingMethod},
    events::{EventProducers, OrderPaidEvent},
    order_objects::{CartQuote, PaymentStatusView},
    traits::{CommerceDatabase, CommerceError, PaymentEventOutcome},
};

/// `OrderFlowApi` is the primary API for the order and payment lifecycle: quoting and checking
/// out carts, folding payment events from the rails into orders, re-issuing unsettled payments
/// and admin-driven fulfilment changes.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: CommerceDatabase
{
    /// Prices the customer's cart without committing anything. Payment initiation calls this to
    /// learn the exact total to scope the payment request to.
    pub async fn quote_cart(
        &self,
        customer_id: &str,
        method: ShippingMethod,
        country: &str,
        tax: Pence,
        discount: Pence,
    ) -> Result<CartQuote, CommerceError> {
        self.db.quote_cart(customer_id, method, country, tax, discount).await
    }

    /// Runs the checkout transaction and, if the payment settled at checkout (immediate capture),
    /// notifies the order-paid subscribers.
    pub async fn checkout(&self, request: CheckoutRequest, payment: NewPayment) -> Result<Order, CommerceError> {
        let order = self.db.checkout(request, payment).await?;
        if order.status == OrderStatusType::Processing {
            self.call_order_paid_hook(&order).await;
        }
        debug!("🛒️ Checkout complete for order {}", order.order_number);
        Ok(order)
    }

    /// Folds a payment event from one of the rails into the order it locates. When the event
    /// settles the payment, the order-paid subscribers are notified after the transaction has
    /// committed.
    pub async fn process_payment_event(&self, event: PaymentEvent) -> Result<PaymentEventOutcome, CommerceError> {
        let outcome = self.db.apply_payment_event(event).await?;
        if let Some(order) = outcome.settled_order() {
            self.call_order_paid_hook(order).await;
        }
        trace!("🔄️ Payment event processed: {outcome}");
        Ok(outcome)
    }

    async fn call_order_paid_hook(&self, order: &Order) {
        for emitter in &self.producers.order_paid_producer {
            debug!("🔄️📦️ Notifying order paid hook subscribers for {}", order.order_number);
            let event = OrderPaidEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    /// The buyer-facing payment snapshot for an order.
    pub async fn payment_status(&self, number: &OrderNumber) -> Result<PaymentStatusView, CommerceError> {
        self.db.payment_status(number).await
    }

    /// Replaces the payment descriptor on an order whose payment never settled.
    pub async fn reissue_payment(
        &self,
        number: &OrderNumber,
        payment: NewPayment,
    ) -> Result<PaymentRecord, CommerceError> {
        self.db.reissue_payment(number, payment).await
    }

    /// An admin-driven fulfilment status change.
    ///
    /// The allowed transitions, with everything else rejected:
    ///
    /// | From \ To  | Processing | Shipped | Delivered | Cancelled |
    /// |------------|------------|---------|-----------|-----------|
    /// | Pending    | Err (1)    | Err     | Err       | Ok        |
    /// | Processing | Err        | Ok      | Err       | Ok        |
    /// | Shipped    | Err        | Err     | Ok        | Err       |
    ///
    /// (1) `Pending → Processing` is owned by the payment flow; admins cannot force it. `Refunded`
    /// is only ever reached through the refund ledger.
    pub async fn update_order_status(
        &self,
        number: &OrderNumber,
        new_status: OrderStatusType,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<Order, CommerceError> {
        self.db.update_order_status(number, new_status, actor, reason).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
