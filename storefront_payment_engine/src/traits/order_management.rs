use thiserror::Error;

use crate::{
    db_types::{CartItem, OrderNumber, Order, Product},
    order_objects::{FullOrder, OrderQueryFilter},
};

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for OrderApiError {
    fn from(e: sqlx::Error) -> Self {
        OrderApiError::DatabaseError(e.to_string())
    }
}

/// Read-only queries over the order ledger and its satellites.
///
/// Nothing here mutates state; lazy payment-window expiry lives on
/// [`CommerceDatabase::payment_status`](crate::traits::CommerceDatabase::payment_status) because
/// it persists the derived status.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderApiError>;

    /// The order plus its items, payment record, refund ledger and status audit trail.
    async fn fetch_full_order(&self, number: &OrderNumber) -> Result<Option<FullOrder>, OrderApiError>;

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError>;

    /// The customer's current cart lines, each paired with the live catalog row for its product.
    async fn fetch_cart(&self, customer_id: &str) -> Result<Vec<(CartItem, Product)>, OrderApiError>;

    async fn fetch_product_by_sku(&self, sku: &str) -> Result<Option<Product>, OrderApiError>;
}
