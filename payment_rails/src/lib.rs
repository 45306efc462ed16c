//! HTTP clients for the three payment rails.
//!
//! Each rail module pairs a thin REST/JSON-RPC client with the wire types its provider speaks:
//!
//! * [`paypal`] — OAuth'd orders-and-captures client for the immediate-capture card rail.
//! * [`monero`] — wallet JSON-RPC client that mints a fresh subaddress per order, plus the
//!   notification payloads the wallet watcher posts back.
//! * [`bitcoin`] — client for the hosted payment processor, which runs its own settlement
//!   accounting and asserts payment status in its webhooks.
//!
//! Nothing in here touches the database; the payment server maps these wire types onto the
//! engine's domain types.
mod error;
mod helpers;

pub mod bitcoin;
pub mod monero;
pub mod paypal;

pub use error::RailApiError;
pub use helpers::{parse_decimal_price, to_decimal_price};

/// Upper bound on any single remote call. A hung rail endpoint must surface as a rail error,
/// never stall a checkout indefinitely.
pub const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

#[cfg(test)]
mod test {
    use crate::{bitcoin::BitcoinProcessorApi, monero::MoneroWalletApi, paypal::PayPalApi};

    // All three clients build with the bounded-timeout configuration.
    #[test]
    fn rail_clients_construct_with_timeouts() {
        assert!(PayPalApi::new(Default::default()).is_ok());
        assert!(MoneroWalletApi::new(Default::default()).is_ok());
        assert!(BitcoinProcessorApi::new(Default::default()).is_ok());
    }
}
