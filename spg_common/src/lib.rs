mod pence;
mod rail;

pub mod op;
mod secret;

pub use pence::{Pence, PenceConversionError, GBP_CURRENCY_CODE, GBP_CURRENCY_CODE_LOWER};
pub use rail::{RailType, UnsupportedRailError};
pub use secret::Secret;
