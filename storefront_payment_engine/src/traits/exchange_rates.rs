use thiserror::Error;

use crate::api::exchange_objects::ExchangeRate;

#[derive(Debug, Clone, Error)]
pub enum ExchangeRateError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("No exchange rate has been posted for {0}")]
    RateDoesNotExist(String),
}

#[allow(async_fn_in_trait)]
pub trait ExchangeRates {
    /// Fetch the newest exchange rate for the given currency. If no rate has ever been posted,
    /// [`ExchangeRateError::RateDoesNotExist`] is returned.
    async fn fetch_last_rate(&self, currency: &str) -> Result<ExchangeRate, ExchangeRateError>;
    /// Save the exchange rate for the given currency. Rates are append-only; the newest wins.
    async fn set_exchange_rate(&self, rate: &ExchangeRate) -> Result<(), ExchangeRateError>;
}
