use std::fmt::Display;

use crate::db_types::{Order, OrderLocator};

/// What happened when a payment event was folded into the ledger.
///
/// Every variant is an acknowledgeable outcome; the webhook boundary returns 200 for all of them
/// and only the logs distinguish an applied event from a redelivery.
#[derive(Debug, Clone)]
pub enum PaymentEventOutcome {
    /// The event changed the payment record. `settled` is true when this event completed the
    /// payment (and therefore moved the order to `Processing`).
    Applied { order: Order, settled: bool },
    /// The payment had already settled; redeliveries must not re-trigger side effects.
    AlreadySettled(Order),
    /// The event carried a confirmation count the record has already seen. Monotonic no-op.
    Stale(Order),
    /// The event kind is not one the ledger reacts to.
    Ignored(String),
    /// Nothing matches the event's order reference.
    UnknownOrder(OrderLocator),
}

impl PaymentEventOutcome {
    pub fn settled_order(&self) -> Option<&Order> {
        match self {
            PaymentEventOutcome::Applied { order, settled: true } => Some(order),
            _ => None,
        }
    }
}

impl Display for PaymentEventOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentEventOutcome::Applied { order, settled: true } => {
                write!(f, "applied; payment for {} settled", order.order_number)
            },
            PaymentEventOutcome::Applied { order, settled: false } => {
                write!(f, "applied to {}", order.order_number)
            },
            PaymentEventOutcome::AlreadySettled(order) => {
                write!(f, "no-op; payment for {} already settled", order.order_number)
            },
            PaymentEventOutcome::Stale(order) => write!(f, "no-op; stale delivery for {}", order.order_number),
            PaymentEventOutcome::Ignored(kind) => write!(f, "ignored event kind {kind}"),
            PaymentEventOutcome::UnknownOrder(locator) => write!(f, "no payment matches {locator}"),
        }
    }
}
