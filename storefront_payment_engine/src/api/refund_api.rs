use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewRefund, Order, RefundEntry},
    events::{EventProducers, OrderRefundedEvent},
    traits::{CommerceDatabase, CommerceError},
};

/// `RefundApi` appends to the refund ledger. The rail-side money movement happens before this is
/// called; this API records the outcome and keeps the order's refund aggregates honest.
pub struct RefundApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for RefundApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RefundApi")
    }
}

impl<B> RefundApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> RefundApi<B>
where B: CommerceDatabase
{
    /// Records a refund the rail has executed, then notifies the order-refunded subscribers.
    pub async fn record_refund(&self, refund: NewRefund) -> Result<(Order, RefundEntry), CommerceError> {
        let (order, entry) = self.db.record_refund(refund).await?;
        for emitter in &self.producers.order_refunded_producer {
            debug!("🧾️📦️ Notifying order refunded hook subscribers for {}", order.order_number);
            let event = OrderRefundedEvent::new(order.clone(), entry.clone());
            emitter.publish_event(event).await;
        }
        Ok((order, entry))
    }

    /// Records a refund attempt the rail rejected. No hook fires; nothing moved.
    pub async fn record_failed_refund(&self, refund: NewRefund) -> Result<RefundEntry, CommerceError> {
        self.db.record_failed_refund(refund).await
    }
}
