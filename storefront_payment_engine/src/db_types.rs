use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use spg_common::{Pence, RailType};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------    OrderNumber      ---------------------------------------------------------
/// The customer-facing order reference. Opaque, unique, and safe to print on an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl FromStr for OrderNumber {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order exists but its payment has not settled yet.
    Pending,
    /// Payment has settled and the order is being prepared for dispatch.
    Processing,
    /// The order has left the warehouse.
    Shipped,
    /// The courier has confirmed delivery.
    Delivered,
    /// The order was cancelled before fulfilment completed.
    Cancelled,
    /// Every penny of the order total has been refunded.
    Refunded,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Processing => write!(f, "Processing"),
            OrderStatusType::Shipped => write!(f, "Shipped"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
            OrderStatusType::Refunded => write!(f, "Refunded"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(pub String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// No funds have been seen for this payment yet.
    Pending,
    /// Funds have been detected but have not met the settlement policy yet.
    AwaitingConfirmation,
    /// The payment has settled in full. Terminal, except for refunds.
    Completed,
    /// Funds settled, but for less than the target amount.
    Underpaid,
    /// The payment window lapsed before settlement.
    Expired,
    /// The rail reported the payment as failed.
    Failed,
    /// The full order total has been returned to the customer.
    Refunded,
}

impl PaymentStatus {
    /// Statuses from which the payment can still settle, and which lazily expire once the
    /// payment window has lapsed.
    pub fn is_live(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::AwaitingConfirmation | PaymentStatus::Underpaid)
    }

    /// Statuses from which an admin may issue a fresh payment descriptor for the order.
    pub fn is_reissuable(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Expired | PaymentStatus::Failed)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::AwaitingConfirmation => write!(f, "AwaitingConfirmation"),
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Underpaid => write!(f, "Underpaid"),
            PaymentStatus::Expired => write!(f, "Expired"),
            PaymentStatus::Failed => write!(f, "Failed"),
            PaymentStatus::Refunded => write!(f, "Refunded"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "AwaitingConfirmation" => Ok(Self::AwaitingConfirmation),
            "Completed" => Ok(Self::Completed),
            "Underpaid" => Ok(Self::Underpaid),
            "Expired" => Ok(Self::Expired),
            "Failed" => Ok(Self::Failed),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to Pending");
            PaymentStatus::Pending
        })
    }
}

//--------------------------------------    RefundStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum RefundStatus {
    /// Nothing has been refunded on this order.
    None,
    /// Some, but not all, of the order total has been refunded.
    PartialRefunded,
    /// The entire order total has been refunded.
    FullyRefunded,
}

impl Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefundStatus::None => write!(f, "None"),
            RefundStatus::PartialRefunded => write!(f, "PartialRefunded"),
            RefundStatus::FullyRefunded => write!(f, "FullyRefunded"),
        }
    }
}

impl FromStr for RefundStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(Self::None),
            "PartialRefunded" => Ok(Self::PartialRefunded),
            "FullyRefunded" => Ok(Self::FullyRefunded),
            s => Err(ConversionError(format!("Invalid refund status: {s}"))),
        }
    }
}

//--------------------------------------  RefundEntryStatus  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum RefundEntryStatus {
    /// The money was returned (or the rail accepted the refund instruction).
    Succeeded,
    /// The rail rejected the refund. The ledger keeps the attempt; the aggregates are untouched.
    Failed,
}

impl Display for RefundEntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefundEntryStatus::Succeeded => write!(f, "Succeeded"),
            RefundEntryStatus::Failed => write!(f, "Failed"),
        }
    }
}

//--------------------------------------   ShippingMethod    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    /// Tracked 48. Free for orders of £50 and over.
    Standard,
    /// Next-day courier. Domestic (GB) addresses only.
    Express,
    /// Click-and-collect from the shop. GB only, always free.
    Collection,
}

impl ShippingMethod {
    /// The delivery charge for this method, or `None` when the method does not serve the
    /// destination country. `country` is an ISO 3166-1 alpha-2 code.
    pub fn cost(&self, subtotal: Pence, country: &str) -> Option<Pence> {
        match self {
            ShippingMethod::Standard => {
                if subtotal >= Pence::from_pounds(50) {
                    Some(Pence::from(0))
                } else {
                    Some(Pence::from(495))
                }
            },
            ShippingMethod::Express => (country == "GB").then(|| Pence::from(995)),
            ShippingMethod::Collection => (country == "GB").then(|| Pence::from(0)),
        }
    }
}

impl Display for ShippingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShippingMethod::Standard => write!(f, "Standard"),
            ShippingMethod::Express => write!(f, "Express"),
            ShippingMethod::Collection => write!(f, "Collection"),
        }
    }
}

impl FromStr for ShippingMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Standard" | "standard" => Ok(Self::Standard),
            "Express" | "express" => Ok(Self::Express),
            "Collection" | "collection" => Ok(Self::Collection),
            s => Err(ConversionError(format!("Invalid shipping method: {s}"))),
        }
    }
}

//--------------------------------------      Address        ---------------------------------------------------------
/// A shipping address. Collection orders still carry one so that the till has a contact name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub recipient: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub postcode: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
}

impl Address {
    /// Returns the first missing required field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.recipient.trim().is_empty() {
            return Some("recipient");
        }
        if self.line1.trim().is_empty() {
            return Some("line1");
        }
        if self.city.trim().is_empty() {
            return Some("city");
        }
        if self.postcode.trim().is_empty() {
            return Some("postcode");
        }
        if self.country.trim().len() != 2 {
            return Some("country");
        }
        None
    }
}

//--------------------------------------      Product        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub price: Pence,
    pub stock: i64,
    pub sellable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub price: Pence,
    pub stock: i64,
    pub sellable: bool,
}

impl NewProduct {
    pub fn new<S1: Into<String>, S2: Into<String>>(sku: S1, name: S2, price: Pence, stock: i64) -> Self {
        Self { sku: sku.into(), name: name.into(), price, stock, sellable: true }
    }
}

//--------------------------------------      CartItem       ---------------------------------------------------------
/// A line in a customer's cart. `cached_price` is what the storefront showed when the item was
/// added; checkout always re-reads the live catalog price.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub customer_id: String,
    pub product_id: i64,
    pub quantity: i64,
    pub cached_price: Pence,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       Order         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub customer_id: String,
    pub email: String,
    pub recipient: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub postcode: String,
    pub country: String,
    pub shipping_method: ShippingMethod,
    pub subtotal: Pence,
    pub shipping: Pence,
    pub tax: Pence,
    pub discount: Pence,
    pub total: Pence,
    pub total_refunded: Pence,
    pub refund_status: RefundStatus,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The amount that can still be refunded on this order.
    pub fn refundable_remainder(&self) -> Pence {
        self.total - self.total_refunded
    }
}

//--------------------------------------      NewOrder       ---------------------------------------------------------
/// A fully priced order, ready for insertion. Built inside the checkout transaction; totals come
/// from the live catalog, never from the request.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub customer_id: String,
    pub email: String,
    pub address: Address,
    pub shipping_method: ShippingMethod,
    pub subtotal: Pence,
    pub shipping: Pence,
    pub tax: Pence,
    pub discount: Pence,
    pub total: Pence,
}

//--------------------------------------     OrderItem       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Pence,
    pub line_total: Pence,
}

//-------------------------------------- StatusHistoryEntry  ---------------------------------------------------------
/// One row of the order's status audit trail. `old_status` is `None` for the creation entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: i64,
    pub order_id: i64,
    pub old_status: Option<OrderStatusType>,
    pub new_status: OrderStatusType,
    pub actor: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------   PaymentRecord     ---------------------------------------------------------
/// The single payment attached to an order. Created at checkout and updated in place as webhook
/// events arrive. `confirmations` stays `NULL` until the first event for the payment.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: i64,
    pub order_id: i64,
    pub rail: RailType,
    pub status: PaymentStatus,
    /// What the customer owes, in the rail's atomic unit.
    pub target_amount: i64,
    /// Cumulative funds seen so far, in the rail's atomic unit.
    pub amount_received: i64,
    pub confirmations: Option<i64>,
    pub receiving_address: Option<String>,
    /// The processor's identifier for this payment (capture id, payment request id).
    pub external_ref: Option<String>,
    pub last_txid: Option<String>,
    /// Rail-specific display data (payment URIs, integrated addresses) as a JSON string.
    pub descriptor: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     NewPayment      ---------------------------------------------------------
/// The payment instruction handed to checkout (or to a re-initiation).
///
/// For PayPal the capture has already happened, so `status` is `Completed` and `target_amount`
/// must equal the order total in pence. For the crypto rails `status` is `Pending` and
/// `target_amount` is in the rail's atomic unit.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub rail: RailType,
    pub status: PaymentStatus,
    pub target_amount: i64,
    pub receiving_address: Option<String>,
    pub external_ref: Option<String>,
    pub descriptor: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewPayment {
    /// A settled PayPal capture. The target is the order total in pence.
    pub fn settled(rail: RailType, total: Pence, external_ref: String) -> Self {
        Self {
            rail,
            status: PaymentStatus::Completed,
            target_amount: total.value(),
            receiving_address: None,
            external_ref: Some(external_ref),
            descriptor: None,
            expires_at: None,
        }
    }

    /// A pending crypto payment awaiting funds at `address`.
    pub fn pending(rail: RailType, target_amount: i64, address: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            rail,
            status: PaymentStatus::Pending,
            target_amount,
            receiving_address: Some(address),
            external_ref: None,
            descriptor: None,
            expires_at: Some(expires_at),
        }
    }

    pub fn with_external_ref<S: Into<String>>(mut self, external_ref: S) -> Self {
        self.external_ref = Some(external_ref.into());
        self
    }

    pub fn with_descriptor<S: Into<String>>(mut self, descriptor: S) -> Self {
        self.descriptor = Some(descriptor.into());
        self
    }
}

//--------------------------------------  CheckoutRequest    ---------------------------------------------------------
/// Everything the buyer supplies at checkout. The cart itself is read from storage; prices in the
/// request are never trusted, except `expected_total`, which is only used to detect drift between
/// quoting and committing.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub customer_id: String,
    pub email: String,
    pub address: Address,
    pub shipping_method: ShippingMethod,
    pub tax: Pence,
    pub discount: Pence,
    /// The total the payment descriptor was issued against. When set, checkout fails if the
    /// freshly priced total differs.
    pub expected_total: Option<Pence>,
}

//--------------------------------------     NewRefund       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewRefund {
    pub order_number: OrderNumber,
    pub amount: Pence,
    pub reason: Option<String>,
    pub actor: String,
    /// The rail's reference for the refund, when one exists (PayPal refund id, or a manual
    /// ops reference for the crypto rails).
    pub external_ref: Option<String>,
}

//--------------------------------------    RefundEntry      ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RefundEntry {
    pub id: i64,
    pub order_id: i64,
    pub amount: Pence,
    pub reason: Option<String>,
    pub actor: String,
    pub status: RefundEntryStatus,
    pub external_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------    PaymentEvent     ---------------------------------------------------------
/// How a webhook event locates its payment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderLocator {
    Number(OrderNumber),
    ReceivingAddress(String),
    ExternalRef(String),
}

impl Display for OrderLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderLocator::Number(n) => write!(f, "order {n}"),
            OrderLocator::ReceivingAddress(a) => write!(f, "address {a}"),
            OrderLocator::ExternalRef(r) => write!(f, "external ref {r}"),
        }
    }
}

/// The closed set of event kinds the reconciliation flow understands. Anything else arrives as
/// `Unrecognized` and is logged and acknowledged without touching the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventKind {
    /// Funds were seen for the first time, or the received amount changed.
    Detected,
    /// The confirmation count advanced.
    Confirmation,
    /// The processor asserted a new payment status.
    StatusChanged,
    Unrecognized(String),
}

impl PaymentEventKind {
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "payment_detected" => Self::Detected,
            "payment_confirmation" => Self::Confirmation,
            "status_changed" => Self::StatusChanged,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl Display for PaymentEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentEventKind::Detected => write!(f, "payment_detected"),
            PaymentEventKind::Confirmation => write!(f, "payment_confirmation"),
            PaymentEventKind::StatusChanged => write!(f, "status_changed"),
            PaymentEventKind::Unrecognized(k) => write!(f, "unrecognized({k})"),
        }
    }
}

/// A payment status asserted by a processor that does its own settlement accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorStatus {
    Confirmed,
    PartiallyConfirmed,
    Underpaid,
    Failed,
}

impl FromStr for ProcessorStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "partially_confirmed" => Ok(Self::PartiallyConfirmed),
            "underpaid" => Ok(Self::Underpaid),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid processor status: {s}"))),
        }
    }
}

/// A rail-agnostic payment event, normalised from a webhook payload.
///
/// `amount` and `confirmations` are cumulative totals as seen by the rail, not deltas. Stale
/// deliveries are rejected by comparing `confirmations` against the stored count.
#[derive(Debug, Clone)]
pub struct PaymentEvent {
    pub rail: RailType,
    pub locator: OrderLocator,
    pub kind: PaymentEventKind,
    pub amount: i64,
    pub confirmations: i64,
    pub txid: Option<String>,
    /// Present for rails whose processor asserts settlement itself. Absent for rails where this
    /// system applies its own settlement policy.
    pub processor_status: Option<ProcessorStatus>,
}
