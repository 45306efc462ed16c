//! Stateless pub-sub hooks for payment lifecycle events.
//!
//! The server (or any other embedder) registers async closures against the events it cares about
//! via [`EventHooks`]; the engine publishes into the hooks after the corresponding database
//! transaction has committed. Handlers see only the event payload, never engine internals.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::{OrderPaidEvent, OrderRefundedEvent};
pub use hooks::{EventHandlers, EventHooks, EventProducers};
