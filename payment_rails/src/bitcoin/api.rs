use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    bitcoin::{config::BitcoinProcessorConfig, data_objects::PaymentRequest},
    RailApiError,
};

#[derive(Clone)]
pub struct BitcoinProcessorApi {
    config: BitcoinProcessorConfig,
    client: Arc<Client>,
}

impl BitcoinProcessorApi {
    pub fn new(config: BitcoinProcessorConfig) -> Result<Self, RailApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
            .map_err(|e| RailApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(crate::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RailApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, RailApiError> {
        let url = format!("{}{path}", self.config.api_base);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| RailApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            response.json::<T>().await.map_err(|e| RailApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| RailApiError::RestResponseError(e.to_string()))?;
            Err(RailApiError::QueryError { status, message })
        }
    }

    /// Asks the processor to issue a payment request for `amount_sats`, tagged with our order
    /// number. The processor picks the address and the expiry.
    pub async fn create_payment_request(
        &self,
        amount_sats: i64,
        reference: &str,
    ) -> Result<PaymentRequest, RailApiError> {
        debug!("Creating payment request for {reference}");
        let body = serde_json::json!({
            "amount": amount_sats,
            "reference": reference,
        });
        let pr = self.rest_query::<PaymentRequest, _>(Method::POST, "/payment-requests", Some(body)).await?;
        info!("Payment request {} issued for {reference}", pr.id);
        Ok(pr)
    }

    pub async fn get_payment_request(&self, id: &str) -> Result<PaymentRequest, RailApiError> {
        let path = format!("/payment-requests/{id}");
        self.rest_query::<PaymentRequest, ()>(Method::GET, &path, None).await
    }
}
