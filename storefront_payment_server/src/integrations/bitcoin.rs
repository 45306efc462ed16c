use std::str::FromStr;

use payment_rails::bitcoin::{BtcPayNotification, PaymentRequest};
use spg_common::RailType;
use storefront_payment_engine::db_types::{
    NewPayment,
    OrderLocator,
    PaymentEvent,
    PaymentEventKind,
    ProcessorStatus,
};

/// Builds the pending payment record for a processor-issued payment request. The processor picks
/// the address and the expiry; its request id is the `external_ref` later webhooks locate by.
pub fn pending_payment(pr: &PaymentRequest) -> NewPayment {
    let mut payment = NewPayment::pending(RailType::Bitcoin, pr.amount, pr.address.clone(), pr.expires_at)
        .with_external_ref(pr.id.clone());
    if let Some(uri) = &pr.uri {
        payment = payment.with_descriptor(uri.clone());
    }
    payment
}

/// Normalises a processor webhook. The processor runs its own settlement accounting, so its
/// status assertion rides along and the engine maps it at face value. A status string outside the
/// known set downgrades the whole event to `Unrecognized`, which the reconciliation flow
/// acknowledges without touching the ledger.
pub fn payment_event_from_notification(n: BtcPayNotification) -> PaymentEvent {
    let (kind, processor_status) = match ProcessorStatus::from_str(&n.status) {
        Ok(status) => (PaymentEventKind::from_wire(&n.event_type), Some(status)),
        Err(_) => (PaymentEventKind::Unrecognized(n.status.clone()), None),
    };
    PaymentEvent {
        rail: RailType::Bitcoin,
        locator: OrderLocator::ExternalRef(n.payment_request_id),
        kind,
        amount: n.paid_amount,
        confirmations: n.confirmations,
        txid: n.txid,
        processor_status,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn notification(status: &str) -> BtcPayNotification {
        BtcPayNotification {
            event_type: "status_changed".to_string(),
            payment_request_id: "pr_9f8e7d6c".to_string(),
            status: status.to_string(),
            confirmations: 3,
            paid_amount: 7_492_500,
            txid: Some("4a5c9dde".to_string()),
        }
    }

    #[test]
    fn processor_assertions_ride_along() {
        let event = payment_event_from_notification(notification("confirmed"));
        assert_eq!(event.kind, PaymentEventKind::StatusChanged);
        assert_eq!(event.processor_status, Some(ProcessorStatus::Confirmed));
        assert_eq!(event.locator, OrderLocator::ExternalRef("pr_9f8e7d6c".to_string()));
    }

    #[test]
    fn unknown_statuses_downgrade_the_event() {
        let event = payment_event_from_notification(notification("on_hold"));
        assert_eq!(event.kind, PaymentEventKind::Unrecognized("on_hold".to_string()));
        assert!(event.processor_status.is_none());
    }
}
