use crate::db_types::{Order, RefundEntry};

/// Published once a payment has settled and the order has moved to `Processing`. The fulfilment
/// side (pick, pack, ship) hangs off this event.
#[derive(Debug, Clone)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Published after a refund has been committed to the ledger. Carries the order as it stands
/// after the refund, so subscribers can tell a partial refund from a full one.
#[derive(Debug, Clone)]
pub struct OrderRefundedEvent {
    pub order: Order,
    pub refund: RefundEntry,
}

impl OrderRefundedEvent {
    pub fn new(order: Order, refund: RefundEntry) -> Self {
        Self { order, refund }
    }
}
