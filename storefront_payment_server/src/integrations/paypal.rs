use payment_rails::paypal::Capture;
use spg_common::{Pence, RailType};
use storefront_payment_engine::db_types::NewPayment;

/// A capture that completed for the full cart total. The capture id becomes the payment's
/// `external_ref` so refunds can find their way back to the provider.
pub fn settled_payment_from_capture(capture: &Capture, total: Pence) -> NewPayment {
    NewPayment::settled(RailType::PayPal, total, capture.id.clone())
}
