use std::fmt::Debug;

use crate::{
    db_types::{CartItem, Order, OrderNumber, Product},
    order_objects::{FullOrder, OrderQueryFilter},
    traits::{OrderApiError, OrderManagement},
};

/// The read-only query surface over orders, carts and the catalog.
pub struct CommerceQueryApi<B> {
    db: B,
}

impl<B> Debug for CommerceQueryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CommerceQueryApi")
    }
}

impl<B> CommerceQueryApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderApiError> {
        self.db.fetch_order_by_number(number).await
    }

    /// The order with its items, payment record, refund ledger and audit trail.
    pub async fn fetch_full_order(&self, number: &OrderNumber) -> Result<Option<FullOrder>, OrderApiError> {
        self.db.fetch_full_order(number).await
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError> {
        self.db.search_orders(query).await
    }

    pub async fn fetch_cart(&self, customer_id: &str) -> Result<Vec<(CartItem, Product)>, OrderApiError> {
        self.db.fetch_cart(customer_id).await
    }

    pub async fn fetch_product_by_sku(&self, sku: &str) -> Result<Option<Product>, OrderApiError> {
        self.db.fetch_product_by_sku(sku).await
    }
}
