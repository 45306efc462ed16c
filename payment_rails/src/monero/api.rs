use std::sync::Arc;

use log::*;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    monero::{
        config::MoneroConfig,
        data_objects::{CreatedAddress, RpcEnvelope},
    },
    RailApiError,
};

#[derive(Clone)]
pub struct MoneroWalletApi {
    config: MoneroConfig,
    client: Arc<Client>,
}

impl MoneroWalletApi {
    pub fn new(config: MoneroConfig) -> Result<Self, RailApiError> {
        let client = Client::builder()
            .timeout(crate::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RailApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    async fn rpc_call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RailApiError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": "0",
            "method": method,
            "params": params,
        });
        trace!("Wallet RPC call: {method}");
        let mut req = self.client.post(&self.config.wallet_rpc_url).json(&body);
        if let Some(user) = &self.config.rpc_user {
            req = req.basic_auth(user, Some(self.config.rpc_password.reveal()));
        }
        let response = req.send().await.map_err(|e| RailApiError::RestResponseError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| RailApiError::RestResponseError(e.to_string()))?;
            return Err(RailApiError::QueryError { status, message });
        }
        let envelope = response.json::<RpcEnvelope<T>>().await.map_err(|e| RailApiError::JsonError(e.to_string()))?;
        if let Some(err) = envelope.error {
            return Err(RailApiError::RpcError { code: err.code, message: err.message });
        }
        envelope.result.ok_or_else(|| RailApiError::JsonError(format!("{method} returned neither result nor error")))
    }

    /// Mints a fresh subaddress for one order. The label ties the address back to the order for
    /// wallet-side bookkeeping; the authoritative mapping is the payment record.
    pub async fn create_address(&self, label: &str) -> Result<CreatedAddress, RailApiError> {
        let params = serde_json::json!({
            "account_index": self.config.account_index,
            "label": label,
        });
        let created: CreatedAddress = self.rpc_call("create_address", params).await?;
        info!("Minted subaddress #{} for {label}", created.address_index);
        Ok(created)
    }
}
