use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use spg_common::{Pence, GBP_CURRENCY_CODE};

use crate::{
    paypal::{
        config::PayPalConfig,
        data_objects::{AccessToken, Amount, Capture, PayPalOrder, RefundResult},
    },
    RailApiError,
};

#[derive(Clone)]
pub struct PayPalApi {
    config: PayPalConfig,
    client: Arc<Client>,
}

impl PayPalApi {
    pub fn new(config: PayPalConfig) -> Result<Self, RailApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(crate::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RailApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Fetches a client-credentials bearer token. Tokens are short-lived and cheap; one is
    /// fetched per operation rather than cached.
    pub async fn access_token(&self) -> Result<AccessToken, RailApiError> {
        let url = self.url("/v1/oauth2/token");
        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.client_id, Some(self.config.client_secret.reveal()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| RailApiError::RestResponseError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| RailApiError::RestResponseError(e.to_string()))?;
            return Err(RailApiError::QueryError { status, message });
        }
        response.json::<AccessToken>().await.map_err(|e| RailApiError::JsonError(e.to_string()))
    }

    async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, RailApiError> {
        let token = self.access_token().await?;
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url).bearer_auth(&token.access_token);
        // Retries of a create or capture must not double-charge
        req = req.header("PayPal-Request-Id", format!("{:032x}", rand::random::<u128>()));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| RailApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| RailApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| RailApiError::RestResponseError(e.to_string()))?;
            Err(RailApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base)
    }

    /// Creates a capture-intent order for `total`, tagged with our order number so webhooks and
    /// reconciliation can find their way back.
    pub async fn create_order(&self, total: Pence, reference: &str) -> Result<PayPalOrder, RailApiError> {
        debug!("Creating capture-intent order for {reference}");
        let body = serde_json::json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": reference,
                "amount": Amount::new(GBP_CURRENCY_CODE, total),
            }],
        });
        let order = self.rest_query::<PayPalOrder, _>(Method::POST, "/v2/checkout/orders", Some(body)).await?;
        info!("Created order {} for {reference}", order.id);
        Ok(order)
    }

    pub async fn show_order(&self, order_id: &str) -> Result<PayPalOrder, RailApiError> {
        let path = format!("/v2/checkout/orders/{order_id}");
        self.rest_query::<PayPalOrder, ()>(Method::GET, &path, None).await
    }

    /// Captures an approved order. Hard-fails unless the capture completed for exactly
    /// `expected_total`; a declined or partial capture never reaches checkout.
    pub async fn capture_order(&self, order_id: &str, expected_total: Pence) -> Result<Capture, RailApiError> {
        debug!("Capturing order {order_id}");
        let path = format!("/v2/checkout/orders/{order_id}/capture");
        let order = self.rest_query::<PayPalOrder, ()>(Method::POST, &path, None).await?;
        let capture = order
            .capture()
            .cloned()
            .ok_or_else(|| RailApiError::PaymentNotCompleted(format!("order {order_id} has no capture")))?;
        if capture.status != "COMPLETED" {
            return Err(RailApiError::PaymentNotCompleted(format!(
                "capture {} on order {order_id} is {}",
                capture.id, capture.status
            )));
        }
        let captured = capture.amount.in_pence()?;
        if captured != expected_total {
            return Err(RailApiError::AmountMismatch {
                expected: expected_total.to_string(),
                actual: captured.to_string(),
            });
        }
        info!("Captured {captured} on order {order_id} (capture {})", capture.id);
        Ok(capture)
    }

    /// Refunds part or all of a capture. The capture id is the `external_ref` stored on the
    /// payment record at checkout.
    pub async fn refund_capture(
        &self,
        capture_id: &str,
        amount: Pence,
        note: &str,
    ) -> Result<RefundResult, RailApiError> {
        debug!("Refunding {amount} of capture {capture_id}");
        let path = format!("/v2/payments/captures/{capture_id}/refund");
        let body = serde_json::json!({
            "amount": Amount::new(GBP_CURRENCY_CODE, amount),
            "note_to_payer": note,
        });
        let refund = self.rest_query::<RefundResult, _>(Method::POST, &path, Some(body)).await?;
        if refund.status != "COMPLETED" && refund.status != "PENDING" {
            return Err(RailApiError::PaymentNotCompleted(format!("refund {} is {}", refund.id, refund.status)));
        }
        info!("Refund {} of capture {capture_id} is {}", refund.id, refund.status);
        Ok(refund)
    }
}
