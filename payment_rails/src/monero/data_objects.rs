use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct RpcEnvelope<T> {
    #[serde(default = "Option::default")]
    pub result: Option<T>,
    #[serde(default = "Option::default")]
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

/// Result of `create_address`: a fresh subaddress under the configured account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedAddress {
    pub address: String,
    pub address_index: u32,
}

/// What the wallet watcher posts to the payment server when funds appear at, or confirm for, one
/// of our subaddresses. `amount` is the cumulative piconero seen at the address and
/// `confirmations` the depth of the shallowest contributing transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneroPaymentNotification {
    /// `payment_detected` or `payment_confirmation`
    pub event: String,
    pub address: String,
    pub txid: String,
    pub amount: i64,
    pub confirmations: i64,
}
