use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A payment request issued by the processor. `amount` is in satoshi; `uri` is the BIP-21 string
/// shown to the buyer.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    pub id: String,
    /// pending, partially_confirmed, confirmed, underpaid, failed
    pub status: String,
    pub address: String,
    pub amount: i64,
    #[serde(default)]
    pub uri: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// The webhook payload the processor posts as a payment request progresses. `paid_amount` is
/// cumulative satoshi; `status` is the processor's own settlement verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BtcPayNotification {
    /// `status_changed`
    #[serde(rename = "type")]
    pub event_type: String,
    pub payment_request_id: String,
    pub status: String,
    pub confirmations: i64,
    pub paid_amount: i64,
    #[serde(default)]
    pub txid: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn payment_request_parses() {
        let json = r#"{
            "id": "pr_9f8e7d6c",
            "status": "pending",
            "address": "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
            "amount": 7492500,
            "uri": "bitcoin:bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4?amount=0.074925",
            "expires_at": "2026-08-24T13:00:00Z"
        }"#;
        let pr: PaymentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(pr.id, "pr_9f8e7d6c");
        assert_eq!(pr.amount, 7_492_500);
        assert!(pr.uri.unwrap().starts_with("bitcoin:"));
    }

    #[test]
    fn processor_webhook_parses() {
        let json = r#"{
            "type": "status_changed",
            "payment_request_id": "pr_9f8e7d6c",
            "status": "confirmed",
            "confirmations": 3,
            "paid_amount": 7492500,
            "txid": "4a5c9ddecfa5b4b1861dbc3a762de8d58c1a19ad5bbecc2ef61a931e7a0c8f02"
        }"#;
        let n: BtcPayNotification = serde_json::from_str(json).unwrap();
        assert_eq!(n.event_type, "status_changed");
        assert_eq!(n.status, "confirmed");
        assert_eq!(n.paid_amount, 7_492_500);
    }
}
