use log::*;
use spg_common::Secret;

#[derive(Debug, Clone, Default)]
pub struct MoneroConfig {
    /// e.g. `http://127.0.0.1:18083/json_rpc`
    pub wallet_rpc_url: String,
    pub rpc_user: Option<String>,
    pub rpc_password: Secret<String>,
    /// The wallet account subaddresses are minted under.
    pub account_index: u32,
}

impl MoneroConfig {
    pub fn new_from_env_or_default() -> Self {
        let wallet_rpc_url = std::env::var("SPG_MONERO_WALLET_RPC_URL").unwrap_or_else(|_| {
            warn!("SPG_MONERO_WALLET_RPC_URL not set, using localhost default");
            "http://127.0.0.1:18083/json_rpc".to_string()
        });
        let rpc_user = std::env::var("SPG_MONERO_RPC_USER").ok();
        let rpc_password = Secret::new(std::env::var("SPG_MONERO_RPC_PASSWORD").unwrap_or_default());
        let account_index = std::env::var("SPG_MONERO_ACCOUNT_INDEX")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| {
                warn!("SPG_MONERO_ACCOUNT_INDEX not set, using account 0");
                0
            });
        Self { wallet_rpc_url, rpc_user, rpc_password, account_index }
    }
}
