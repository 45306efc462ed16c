use std::fmt::Display;

use serde::{Deserialize, Serialize};
use spg_common::{Pence, RailType};
use storefront_payment_engine::db_types::{Address, OrderStatusType, ShippingMethod};

/// The body every webhook delivery is acknowledged with. `received` is always true on a 200;
/// whether the event changed anything lives in the message and the server logs, so the rails
/// never retry a delivery we have already seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
    pub message: String,
}

impl WebhookAck {
    pub fn received<S: Display>(message: S) -> Self {
        Self { received: true, message: message.to_string() }
    }
}

/// What the storefront posts to start a checkout on any rail. The cart itself lives server-side;
/// this only carries the buyer's details and the adjustments the storefront computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutPayload {
    pub customer_id: String,
    pub email: String,
    pub address: Address,
    pub shipping_method: ShippingMethod,
    #[serde(default)]
    pub tax: Pence,
    #[serde(default)]
    pub discount: Pence,
}

/// The second leg of the immediate-capture flow: the buyer has approved the provider order and
/// the storefront asks us to capture it and commit the checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturePayload {
    pub provider_order_id: String,
    pub checkout: CheckoutPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReissueRequest {
    pub rail: RailType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub new_status: OrderStatusType,
    pub actor: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub amount: Pence,
    pub reason: String,
    pub actor: String,
    /// For the crypto rails, the ops reference for the manual payout. Ignored for the
    /// immediate-capture rail, where the provider supplies the reference.
    #[serde(default)]
    pub external_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRateUpdate {
    /// ISO 4217-ish code, e.g. "XMR" or "BTC".
    pub currency: String,
    /// Atomic units of `currency` per penny.
    pub rate: i64,
}

/// What the buyer needs to pay: the order that was created and the rail-specific payment
/// instructions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInitResponse {
    pub order_number: String,
    pub rail: RailType,
    /// In the rail's atomic unit.
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// The first leg of the immediate-capture flow: the provider order to send the buyer to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderOrderResponse {
    pub provider_order_id: String,
    /// Where the storefront should redirect the buyer to approve the payment.
    pub approval_url: String,
    pub total: Pence,
}
