use serde::{Deserialize, Serialize};
use spg_common::Pence;

use crate::{helpers::to_decimal_price, RailApiError};

#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Amount {
    pub currency_code: String,
    /// Decimal string, e.g. "44.93"
    pub value: String,
}

impl Amount {
    pub fn new(currency_code: &str, amount: Pence) -> Self {
        Self { currency_code: currency_code.to_string(), value: to_decimal_price(amount) }
    }

    pub fn in_pence(&self) -> Result<Pence, RailApiError> {
        crate::helpers::parse_decimal_price(&self.value)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkDescription {
    pub href: String,
    pub rel: String,
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayPalOrder {
    pub id: String,
    /// CREATED, APPROVED, COMPLETED, ...
    pub status: String,
    #[serde(default)]
    pub purchase_units: Vec<PurchaseUnit>,
    #[serde(default)]
    pub links: Vec<LinkDescription>,
}

impl PayPalOrder {
    /// The approval URL the buyer is redirected to, when present.
    pub fn approve_link(&self) -> Option<&str> {
        self.links.iter().find(|l| l.rel == "approve" || l.rel == "payer-action").map(|l| l.href.as_str())
    }

    /// The first capture across the order's purchase units, when the order has been captured.
    pub fn capture(&self) -> Option<&Capture> {
        self.purchase_units.iter().filter_map(|pu| pu.payments.as_ref()).flat_map(|p| p.captures.iter()).next()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseUnit {
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub payments: Option<Payments>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Payments {
    #[serde(default)]
    pub captures: Vec<Capture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Capture {
    pub id: String,
    pub status: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundResult {
    pub id: String,
    pub status: String,
}
