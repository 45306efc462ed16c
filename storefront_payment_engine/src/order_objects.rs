//! Support objects for the order APIs: quotes, full order views and search filters.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spg_common::{Pence, RailType};

use crate::db_types::{
    Order,
    OrderItem,
    OrderStatusType,
    PaymentRecord,
    PaymentStatus,
    RefundEntry,
    StatusHistoryEntry,
};

//--------------------------------------     PricedLine      ---------------------------------------------------------
/// A cart line after repricing against the live catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: i64,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Pence,
    pub line_total: Pence,
}

//--------------------------------------      CartQuote      ---------------------------------------------------------
/// The outcome of pricing a cart. Checkout commits exactly these numbers, or nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartQuote {
    pub lines: Vec<PricedLine>,
    pub subtotal: Pence,
    pub shipping: Pence,
    pub tax: Pence,
    pub discount: Pence,
    pub total: Pence,
}

//--------------------------------------      FullOrder      ---------------------------------------------------------
/// Everything the admin screen shows for one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Option<PaymentRecord>,
    pub refunds: Vec<RefundEntry>,
    pub history: Vec<StatusHistoryEntry>,
}

//-------------------------------------- PaymentStatusView   ---------------------------------------------------------
/// The buyer-facing payment status snapshot. Expiry is evaluated at read time, so a lapsed
/// payment window shows up here even if no webhook has arrived since it lapsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusView {
    pub order_number: String,
    pub rail: RailType,
    pub payment_status: PaymentStatus,
    pub confirmations: Option<i64>,
    /// In the rail's atomic unit.
    pub amount_received: i64,
    /// In the rail's atomic unit.
    pub target_amount: i64,
    pub is_expired: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

//-------------------------------------- OrderQueryFilter    ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub order_number: Option<String>,
    pub customer_id: Option<String>,
    pub rail: Option<RailType>,
    pub status: Option<Vec<OrderStatusType>>,
    pub payment_status: Option<Vec<PaymentStatus>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn with_order_number<S: Into<String>>(mut self, number: S) -> Self {
        self.order_number = Some(number.into());
        self
    }

    pub fn with_customer_id<S: Into<String>>(mut self, customer_id: S) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_rail(mut self, rail: RailType) -> Self {
        self.rail = Some(rail);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn with_payment_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_number.is_none() &&
            self.customer_id.is_none() &&
            self.rail.is_none() &&
            self.status.is_none() &&
            self.payment_status.is_none() &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters.");
        }
        if let Some(number) = &self.order_number {
            write!(f, "order_number: {number}. ")?;
        }
        if let Some(cid) = &self.customer_id {
            write!(f, "customer_id: {cid}. ")?;
        }
        if let Some(rail) = &self.rail {
            write!(f, "rail: {rail}. ")?;
        }
        if let Some(statuses) = &self.status {
            let s = statuses.iter().map(|s| s.to_string()).collect::<Vec<_>>().join("|");
            write!(f, "status: {s}. ")?;
        }
        if let Some(statuses) = &self.payment_status {
            let s = statuses.iter().map(|s| s.to_string()).collect::<Vec<_>>().join("|");
            write!(f, "payment_status: {s}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since: {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until: {until}. ")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn filter_builder_collects_statuses() {
        let q = OrderQueryFilter::default()
            .with_customer_id("cust-9")
            .with_status(OrderStatusType::Pending)
            .with_status(OrderStatusType::Processing);
        assert_eq!(q.status.as_ref().map(Vec::len), Some(2));
        assert!(!q.is_empty());
        assert_eq!(q.to_string(), "customer_id: cust-9. status: Pending|Processing. ");
    }

    #[test]
    fn empty_filter_reports_itself() {
        let q = OrderQueryFilter::default();
        assert!(q.is_empty());
        assert_eq!(q.to_string(), "No filters.");
    }
}
