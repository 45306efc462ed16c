//! Storefront Payment Engine
//!
//! The core order-and-payment orchestration for the storefront. It owns the order lifecycle from
//! cart quote through checkout, payment settlement across three rails (immediate card capture and
//! two crypto rails), refunds, and the fulfilment state machine. It is transport-agnostic: the
//! payment server feeds it webhooks and admin calls, but nothing in here knows about HTTP.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). You should never need to access the
//!    database directly; use the public API instead. The exception is the data types, which live
//!    in [`mod@db_types`] and are public.
//! 2. The engine public API ([`mod@api`]). Each API is constructed over a backend implementing
//!    the relevant traits from [`mod@traits`], so alternative backends can slot in without
//!    touching callers.
//!
//! The engine also emits events when orders are paid or refunded. Embedders subscribe via
//! [`events::EventHooks`] and receive events after the corresponding transaction has committed.
mod api;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod order_objects;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{
    exchange_objects::ExchangeRate,
    exchange_rate_api::ExchangeRateApi,
    order_flow_api::OrderFlowApi,
    query_api::CommerceQueryApi,
    refund_api::RefundApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
