use std::env;

use chrono::Duration;
use log::*;
use payment_rails::{bitcoin::BitcoinProcessorConfig, monero::MoneroConfig, paypal::PayPalConfig};
use spg_common::Secret;

const DEFAULT_SPG_HOST: &str = "127.0.0.1";
const DEFAULT_SPG_PORT: u16 = 8360;
const DEFAULT_PAYMENT_WINDOW: Duration = Duration::minutes(120);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The shared key admin and storefront clients must present in the `spg-api-key` header.
    pub api_key: Secret<String>,
    /// If false, webhook HMAC signatures are not checked. **DANGER**: only for local testing.
    pub hmac_checks: bool,
    /// The signing key for incoming Monero watcher webhooks.
    pub monero_webhook_secret: Secret<String>,
    /// The signing key for incoming Bitcoin processor webhooks.
    pub btc_webhook_secret: Secret<String>,
    /// How long a pending crypto payment stays payable before the order lapses.
    pub payment_window: Duration,
    pub paypal: PayPalConfig,
    pub monero: MoneroConfig,
    pub btc: BitcoinProcessorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPG_HOST.to_string(),
            port: DEFAULT_SPG_PORT,
            database_url: String::default(),
            api_key: Secret::default(),
            hmac_checks: true,
            monero_webhook_secret: Secret::default(),
            btc_webhook_secret: Secret::default(),
            payment_window: DEFAULT_PAYMENT_WINDOW,
            paypal: PayPalConfig::default(),
            monero: MoneroConfig::default(),
            btc: BitcoinProcessorConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SPG_HOST").ok().unwrap_or_else(|| DEFAULT_SPG_HOST.into());
        let port = env::var("SPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SPG_PORT. {e} Using the default, {DEFAULT_SPG_PORT}, instead."
                    );
                    DEFAULT_SPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SPG_PORT);
        let database_url = env::var("SPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SPG_DATABASE_URL is not set. Please set it to the URL for the storefront database.");
            String::default()
        });
        let api_key = Secret::new(env::var("SPG_API_KEY").ok().unwrap_or_else(|| {
            error!("🪛️ SPG_API_KEY is not set. No client will be able to authenticate against this server.");
            String::default()
        }));
        let hmac_checks = env::var("SPG_HMAC_CHECKS").map(|s| &s != "0" && &s != "false").unwrap_or(true);
        if !hmac_checks {
            warn!("🚨️ Webhook HMAC checks are DISABLED. Anyone can forge payment notifications. 🚨️");
        }
        let monero_webhook_secret = Secret::new(env::var("SPG_MONERO_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!("🪛️ SPG_MONERO_WEBHOOK_SECRET is not set. Monero webhooks will fail their signature check.");
            String::default()
        }));
        let btc_webhook_secret = Secret::new(env::var("SPG_BTC_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!("🪛️ SPG_BTC_WEBHOOK_SECRET is not set. Bitcoin webhooks will fail their signature check.");
            String::default()
        }));
        let payment_window = configure_payment_window();
        Self {
            host,
            port,
            database_url,
            api_key,
            hmac_checks,
            monero_webhook_secret,
            btc_webhook_secret,
            payment_window,
            paypal: PayPalConfig::new_from_env_or_default(),
            monero: MoneroConfig::new_from_env_or_default(),
            btc: BitcoinProcessorConfig::new_from_env_or_default(),
        }
    }
}

fn configure_payment_window() -> Duration {
    env::var("SPG_PAYMENT_WINDOW_MINUTES")
        .map_err(|_| {
            info!(
                "🪛️ SPG_PAYMENT_WINDOW_MINUTES is not set. Using the default value of {} minutes.",
                DEFAULT_PAYMENT_WINDOW.num_minutes()
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::minutes)
                .map_err(|e| warn!("🪛️ Invalid configuration value for SPG_PAYMENT_WINDOW_MINUTES. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_PAYMENT_WINDOW)
}
