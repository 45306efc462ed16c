//! Interface contracts for the payment engine database backends.
//!
//! The engine never talks to a storage engine directly; it works against these traits so that a
//! backend (SQLite today) can be swapped out, and so that the server endpoints can be tested
//! against mocks.
//!
//! * [`CommerceDatabase`] is the write side: the checkout transaction, webhook reconciliation,
//!   the refund ledger and fulfilment status changes. Every method is one atomic unit.
//! * [`OrderManagement`] is the read side: order lookups, full order views and filtered search.
//! * [`ExchangeRates`] stores the admin-posted crypto conversion rates.
mod commerce_database;
mod data_objects;
mod exchange_rates;
mod order_management;

pub use commerce_database::{CommerceDatabase, CommerceError};
pub use data_objects::PaymentEventOutcome;
pub use exchange_rates::{ExchangeRateError, ExchangeRates};
pub use order_management::{OrderApiError, OrderManagement};
