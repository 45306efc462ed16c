use log::*;
use spg_common::Secret;

#[derive(Debug, Clone, Default)]
pub struct BitcoinProcessorConfig {
    /// e.g. `https://btc-processor.example.com/api/v1`
    pub api_base: String,
    pub api_key: Secret<String>,
}

impl BitcoinProcessorConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_base = std::env::var("SPG_BTC_PROCESSOR_API_BASE").unwrap_or_else(|_| {
            warn!("SPG_BTC_PROCESSOR_API_BASE not set, using (probably useless) default");
            "http://localhost:14142/api/v1".to_string()
        });
        let api_key = Secret::new(std::env::var("SPG_BTC_PROCESSOR_API_KEY").unwrap_or_else(|_| {
            warn!("SPG_BTC_PROCESSOR_API_KEY not set, using (probably useless) default");
            "btc-processor-api-key".to_string()
        }));
        Self { api_base, api_key }
    }
}
