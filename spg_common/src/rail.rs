use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

/// The payment rails that can settle an order.
///
/// Stored in the database and carried on the wire as a lowercase string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RailType {
    PayPal,
    Monero,
    Bitcoin,
}

impl RailType {
    /// The currency the rail settles in. Used to look up exchange rates for crypto rails.
    pub fn currency_code(&self) -> &'static str {
        match self {
            Self::PayPal => "GBP",
            Self::Monero => "XMR",
            Self::Bitcoin => "BTC",
        }
    }

    /// The atomic unit that `target_amount` and `amount_received` are denominated in.
    pub fn atomic_unit(&self) -> &'static str {
        match self {
            Self::PayPal => "pence",
            Self::Monero => "piconero",
            Self::Bitcoin => "satoshi",
        }
    }
}

impl Display for RailType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PayPal => write!(f, "PayPal"),
            Self::Monero => write!(f, "Monero"),
            Self::Bitcoin => write!(f, "Bitcoin"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Unsupported payment rail: {0}")]
pub struct UnsupportedRailError(pub String);

impl FromStr for RailType {
    type Err = UnsupportedRailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "paypal" => Ok(Self::PayPal),
            "monero" | "xmr" => Ok(Self::Monero),
            "bitcoin" | "btc" => Ok(Self::Bitcoin),
            _ => Err(UnsupportedRailError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rails_parse_from_path_segments() {
        assert_eq!(RailType::from_str("paypal").unwrap(), RailType::PayPal);
        assert_eq!(RailType::from_str("Monero").unwrap(), RailType::Monero);
        assert_eq!(RailType::from_str("BTC").unwrap(), RailType::Bitcoin);
        assert!(RailType::from_str("cheque").is_err());
    }

    #[test]
    fn serde_uses_lowercase_tags() {
        let json = serde_json::to_string(&RailType::PayPal).unwrap();
        assert_eq!(json, "\"paypal\"");
        let rail: RailType = serde_json::from_str("\"bitcoin\"").unwrap();
        assert_eq!(rail, RailType::Bitcoin);
    }
}
