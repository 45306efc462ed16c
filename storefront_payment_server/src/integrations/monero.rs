use payment_rails::monero::{CreatedAddress, MoneroPaymentNotification};
use spg_common::RailType;
use storefront_payment_engine::db_types::{NewPayment, OrderLocator, PaymentEvent, PaymentEventKind};

/// Builds the pending payment record for a freshly minted subaddress. The payment URI doubles as
/// the descriptor the storefront renders as a QR code.
pub fn pending_payment(
    created: &CreatedAddress,
    target_piconero: i64,
    expires_at: chrono::DateTime<chrono::Utc>,
) -> NewPayment {
    let uri = format!("monero:{}?tx_amount={}", created.address, target_piconero);
    NewPayment::pending(RailType::Monero, target_piconero, created.address.clone(), expires_at).with_descriptor(uri)
}

/// Normalises a wallet watcher notification. The receiving address is the locator; settlement
/// policy (confirmation threshold, amount check) stays in the engine.
pub fn payment_event_from_notification(n: MoneroPaymentNotification) -> PaymentEvent {
    PaymentEvent {
        rail: RailType::Monero,
        locator: OrderLocator::ReceivingAddress(n.address),
        kind: PaymentEventKind::from_wire(&n.event),
        amount: n.amount,
        confirmations: n.confirmations,
        txid: Some(n.txid),
        processor_status: None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn watcher_notifications_map_onto_the_confirmation_flow() {
        let n = MoneroPaymentNotification {
            event: "payment_confirmation".to_string(),
            address: "87zYhsjy3h".to_string(),
            txid: "8b3e4f2d".to_string(),
            amount: 274_725_000_000,
            confirmations: 2,
        };
        let event = payment_event_from_notification(n);
        assert_eq!(event.kind, PaymentEventKind::Confirmation);
        assert_eq!(event.locator, OrderLocator::ReceivingAddress("87zYhsjy3h".to_string()));
        assert!(event.processor_status.is_none());
    }
}
