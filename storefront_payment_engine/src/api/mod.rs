//! # Storefront payment engine public API
//!
//! The `api` module exposes the programmatic API for the payment engine. It is modular, so
//! embedders can pick and choose: a storefront front-end might only need [`query_api`], while the
//! payment server wires up the full set.
//!
//! * [`order_flow_api`] drives the order lifecycle: quoting and checking out carts, folding
//!   payment events from the rails into orders, and admin fulfilment changes.
//! * [`refund_api`] appends to the refund ledger.
//! * [`query_api`] is the read-only view over orders, carts and the catalog.
//! * [`exchange_rate_api`] manages the sterling→crypto conversion rates the crypto rails quote
//!   with.
//!
//! The pattern for using the APIs is uniform: construct one by handing it a database backend that
//! implements the traits the API needs.
//!
//! ```rust,ignore
//! use storefront_payment_engine::{CommerceQueryApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/storefront.db", 10).await?;
//! let api = CommerceQueryApi::new(db);
//! let order = api.fetch_order_by_number(&number).await?;
//! ```

pub mod exchange_objects;
pub mod exchange_rate_api;
pub mod order_flow_api;
pub mod query_api;
pub mod refund_api;
