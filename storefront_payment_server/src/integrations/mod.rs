//! Mapping between each rail's wire types and the engine's domain types.
//!
//! The engine never sees a provider payload; these modules normalise captures, wallet watcher
//! notifications and processor webhooks into [`NewPayment`]s and [`PaymentEvent`]s before anything
//! touches the database.
//!
//! [`NewPayment`]: storefront_payment_engine::db_types::NewPayment
//! [`PaymentEvent`]: storefront_payment_engine::db_types::PaymentEvent

pub mod bitcoin;
pub mod monero;
pub mod paypal;
