//! Client for the immediate-capture card rail.
//!
//! The flow is create → buyer approves → capture. Capture either completes in full or the whole
//! payment fails; there is no partial settlement on this rail, which is why a captured order can
//! go straight to fulfilment.
mod api;
mod config;
mod data_objects;

pub use api::PayPalApi;
pub use config::PayPalConfig;
pub use data_objects::{Amount, Capture, PayPalOrder, RefundResult};
