//! Client for the processor-based crypto rail.
//!
//! The hosted processor quotes an amount, issues a payment request with its own address and
//! expiry, and runs the settlement accounting itself. Its webhooks assert a payment status which
//! the engine maps directly instead of applying the local confirmation policy.
mod api;
mod config;
mod data_objects;

pub use api::BitcoinProcessorApi;
pub use config::BitcoinProcessorConfig;
pub use data_objects::{BtcPayNotification, PaymentRequest};
