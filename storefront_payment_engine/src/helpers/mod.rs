mod order_numbers;
mod pricing;
mod settlement;

pub use order_numbers::new_order_number;
pub use pricing::{price_cart, PricingError};
pub use settlement::{derive_payment_status, REQUIRED_CONFIRMATIONS};
