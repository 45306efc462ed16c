use log::*;
use spg_common::Secret;

#[derive(Debug, Clone, Default)]
pub struct PayPalConfig {
    /// e.g. `https://api-m.sandbox.paypal.com` or `https://api-m.paypal.com`
    pub api_base: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
}

impl PayPalConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_base = std::env::var("SPG_PAYPAL_API_BASE").unwrap_or_else(|_| {
            warn!("SPG_PAYPAL_API_BASE not set, using the sandbox");
            "https://api-m.sandbox.paypal.com".to_string()
        });
        let client_id = std::env::var("SPG_PAYPAL_CLIENT_ID").unwrap_or_else(|_| {
            warn!("SPG_PAYPAL_CLIENT_ID not set, using (probably useless) default");
            "paypal-client-id".to_string()
        });
        let client_secret = Secret::new(std::env::var("SPG_PAYPAL_CLIENT_SECRET").unwrap_or_else(|_| {
            warn!("SPG_PAYPAL_CLIENT_SECRET not set, using (probably useless) default");
            "paypal-client-secret".to_string()
        }));
        Self { api_base, client_id, client_secret }
    }
}
