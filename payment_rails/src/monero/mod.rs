//! Client for the wallet-monitored crypto rail.
//!
//! The wallet RPC mints a fresh subaddress per order; a watcher process monitors the wallet and
//! posts signed notifications to the payment server as funds appear and confirm. Settlement
//! policy lives in the engine, not here.
mod api;
mod config;
mod data_objects;

pub use api::MoneroWalletApi;
pub use config::MoneroConfig;
pub use data_objects::{CreatedAddress, MoneroPaymentNotification};
