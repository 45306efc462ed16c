//! Manages the sterling→crypto exchange rates used to scope crypto payment requests. Rates are
//! pushed by an admin (or a price feed) and read at payment-initiation time.

use std::fmt::Debug;

use crate::{
    api::exchange_objects::ExchangeRate,
    traits::{ExchangeRateError, ExchangeRates},
};

pub struct ExchangeRateApi<B> {
    db: B,
}

impl<B> Debug for ExchangeRateApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExchangeRateApi")
    }
}

impl<B> ExchangeRateApi<B>
where B: ExchangeRates
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn fetch_last_rate(&self, currency: &str) -> Result<ExchangeRate, ExchangeRateError> {
        self.db.fetch_last_rate(currency).await
    }

    pub async fn set_exchange_rate(&self, rate: &ExchangeRate) -> Result<(), ExchangeRateError> {
        self.db.set_exchange_rate(rate).await
    }
}
