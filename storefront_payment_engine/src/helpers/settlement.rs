//! Settlement policy for incoming payment events.

use crate::db_types::{PaymentStatus, ProcessorStatus};

/// Confirmation depth at which locally-verified rails treat funds as settled.
pub const REQUIRED_CONFIRMATIONS: i64 = 2;

/// Derives the payment status after an event has been folded into the payment record.
///
/// Rails whose processor asserts settlement pass `processor_status`; for the rest the local
/// policy applies: funds are settled once the target amount is covered at the required
/// confirmation depth. A lapsed payment window turns any still-live status into `Expired`,
/// but never demotes a completed payment.
pub fn derive_payment_status(
    processor_status: Option<ProcessorStatus>,
    target_amount: i64,
    amount_received: i64,
    confirmations: i64,
    expired: bool,
) -> PaymentStatus {
    let status = match processor_status {
        Some(ProcessorStatus::Confirmed) => PaymentStatus::Completed,
        Some(ProcessorStatus::PartiallyConfirmed) => PaymentStatus::AwaitingConfirmation,
        Some(ProcessorStatus::Underpaid) => PaymentStatus::Underpaid,
        Some(ProcessorStatus::Failed) => PaymentStatus::Failed,
        None => {
            if confirmations >= REQUIRED_CONFIRMATIONS && amount_received >= target_amount {
                PaymentStatus::Completed
            } else if confirmations >= REQUIRED_CONFIRMATIONS && amount_received > 0 {
                PaymentStatus::Underpaid
            } else if amount_received > 0 {
                PaymentStatus::AwaitingConfirmation
            } else {
                PaymentStatus::Pending
            }
        },
    };
    if expired && status.is_live() {
        PaymentStatus::Expired
    } else {
        status
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn local_policy_requires_full_amount_at_depth() {
        assert_eq!(derive_payment_status(None, 1000, 1000, 2, false), PaymentStatus::Completed);
        assert_eq!(derive_payment_status(None, 1000, 1200, 5, false), PaymentStatus::Completed);
        assert_eq!(derive_payment_status(None, 1000, 1000, 1, false), PaymentStatus::AwaitingConfirmation);
        assert_eq!(derive_payment_status(None, 1000, 400, 2, false), PaymentStatus::Underpaid);
        assert_eq!(derive_payment_status(None, 1000, 400, 0, false), PaymentStatus::AwaitingConfirmation);
        assert_eq!(derive_payment_status(None, 1000, 0, 0, false), PaymentStatus::Pending);
    }

    #[test]
    fn processor_assertions_are_taken_at_face_value() {
        assert_eq!(derive_payment_status(Some(ProcessorStatus::Confirmed), 1000, 0, 0, false), PaymentStatus::Completed);
        assert_eq!(
            derive_payment_status(Some(ProcessorStatus::PartiallyConfirmed), 1000, 500, 1, false),
            PaymentStatus::AwaitingConfirmation
        );
        assert_eq!(
            derive_payment_status(Some(ProcessorStatus::Underpaid), 1000, 900, 6, false),
            PaymentStatus::Underpaid
        );
        assert_eq!(derive_payment_status(Some(ProcessorStatus::Failed), 1000, 0, 0, false), PaymentStatus::Failed);
    }

    #[test]
    fn expiry_only_claims_live_statuses() {
        assert_eq!(derive_payment_status(None, 1000, 0, 0, true), PaymentStatus::Expired);
        assert_eq!(derive_payment_status(None, 1000, 400, 1, true), PaymentStatus::Expired);
        // Late but sufficient funds still settle
        assert_eq!(derive_payment_status(None, 1000, 1000, 2, true), PaymentStatus::Completed);
        assert_eq!(derive_payment_status(Some(ProcessorStatus::Failed), 1000, 0, 0, true), PaymentStatus::Failed);
    }
}
