use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spg_common::Pence;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExchangeRate {
    /// The crypto currency code this rate quotes, e.g. "XMR" or "BTC".
    pub base_currency: String,
    /// How many atomic units (piconero, satoshi) one penny buys.
    pub rate: i64,
    pub updated_at: DateTime<Utc>,
}

impl ExchangeRate {
    /// Create a new ExchangeRate object
    ///
    /// *NB* The rate is in atomic units per penny (i.e. how many piconero/satoshi one penny buys)
    pub fn new(currency: String, rate_per_penny: i64, updated_at: Option<DateTime<Utc>>) -> Self {
        let updated_at = updated_at.unwrap_or_else(Utc::now);
        Self { base_currency: currency, rate: rate_per_penny, updated_at }
    }

    /// Convert a sterling amount into atomic units of the base currency at this rate.
    pub fn convert(&self, amount: Pence) -> i64 {
        self.rate * amount.value()
    }
}

impl Display for ExchangeRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "1p => {} {}", self.rate, self.base_currency)
    }
}
