//! Pure cart pricing.
//!
//! Checkout and the read-only quote endpoint share this code, so an order can never be committed
//! at a price the quote path would not have produced.

use spg_common::Pence;
use thiserror::Error;

use crate::{
    db_types::{CartItem, Product, ShippingMethod},
    order_objects::{CartQuote, PricedLine},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("The cart is empty")]
    EmptyCart,
    #[error("Product {0} is no longer sold")]
    NotSellable(String),
    #[error("Insufficient stock for {sku}. Requested {requested}, but only {available} available")]
    InsufficientStock { sku: String, requested: i64, available: i64 },
    #[error("{method} shipping is not available to {country}")]
    ShippingUnavailable { method: ShippingMethod, country: String },
    #[error("The discount exceeds the order value. The total may not be negative (got {0})")]
    NegativeTotal(Pence),
}

/// Prices a cart against the live catalog rows.
///
/// `items` pairs each cart line with its product as read inside the caller's transaction. The
/// cached cart price is deliberately ignored; the catalog price at this instant is authoritative.
pub fn price_cart(
    items: &[(CartItem, Product)],
    method: ShippingMethod,
    country: &str,
    tax: Pence,
    discount: Pence,
) -> Result<CartQuote, PricingError> {
    if items.is_empty() {
        return Err(PricingError::EmptyCart);
    }
    let mut lines = Vec::with_capacity(items.len());
    for (item, product) in items {
        if !product.sellable {
            return Err(PricingError::NotSellable(product.sku.clone()));
        }
        if item.quantity > product.stock {
            return Err(PricingError::InsufficientStock {
                sku: product.sku.clone(),
                requested: item.quantity,
                available: product.stock,
            });
        }
        lines.push(PricedLine {
            product_id: product.id,
            sku: product.sku.clone(),
            name: product.name.clone(),
            quantity: item.quantity,
            unit_price: product.price,
            line_total: product.price * item.quantity,
        });
    }
    let subtotal: Pence = lines.iter().map(|l| l.line_total).sum();
    let shipping = method
        .cost(subtotal, country)
        .ok_or_else(|| PricingError::ShippingUnavailable { method, country: country.to_string() })?;
    let total = subtotal + shipping + tax - discount;
    if total.is_negative() {
        return Err(PricingError::NegativeTotal(total));
    }
    Ok(CartQuote { lines, subtotal, shipping, tax, discount, total })
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;

    fn product(id: i64, sku: &str, price: i64, stock: i64) -> Product {
        Product {
            id,
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            price: Pence::from(price),
            stock,
            sellable: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn cart_line(product: &Product, quantity: i64, cached_price: i64) -> (CartItem, Product) {
        let item = CartItem {
            id: product.id,
            customer_id: "cust-1".to_string(),
            product_id: product.id,
            quantity,
            cached_price: Pence::from(cached_price),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        (item, product.clone())
    }

    #[test]
    fn quotes_use_live_prices_not_cached_ones() {
        let p = product(1, "TEE-RED-M", 1800, 10);
        // Cart was filled when the tee cost £15
        let items = vec![cart_line(&p, 2, 1500)];
        let quote =
            price_cart(&items, ShippingMethod::Standard, "GB", Pence::from(0), Pence::from(0)).expect("quote failed");
        assert_eq!(quote.subtotal, Pence::from(3600));
        assert_eq!(quote.shipping, Pence::from(495));
        assert_eq!(quote.total, Pence::from(4095));
    }

    #[test]
    fn free_standard_shipping_threshold_uses_the_fresh_subtotal() {
        let p = product(1, "HOODIE-L", 2600, 5);
        let items = vec![cart_line(&p, 2, 2600)];
        let quote =
            price_cart(&items, ShippingMethod::Standard, "DE", Pence::from(0), Pence::from(0)).expect("quote failed");
        assert_eq!(quote.subtotal, Pence::from(5200));
        assert_eq!(quote.shipping, Pence::from(0));
        assert_eq!(quote.total, Pence::from(5200));
    }

    #[test]
    fn delisted_products_cannot_be_bought() {
        let mut p = product(7, "MUG-OLD", 950, 3);
        p.sellable = false;
        let items = vec![cart_line(&p, 1, 950)];
        let err = price_cart(&items, ShippingMethod::Standard, "GB", Pence::from(0), Pence::from(0)).unwrap_err();
        assert_eq!(err, PricingError::NotSellable("MUG-OLD".to_string()));
    }

    #[test]
    fn oversell_is_caught_before_any_write() {
        let p = product(2, "CAP-BLK", 1200, 1);
        let items = vec![cart_line(&p, 3, 1200)];
        let err = price_cart(&items, ShippingMethod::Standard, "GB", Pence::from(0), Pence::from(0)).unwrap_err();
        assert_eq!(err, PricingError::InsufficientStock { sku: "CAP-BLK".to_string(), requested: 3, available: 1 });
    }

    #[test]
    fn express_to_overseas_address_is_rejected() {
        let p = product(3, "TEE-BLU-S", 1500, 10);
        let items = vec![cart_line(&p, 1, 1500)];
        let err = price_cart(&items, ShippingMethod::Express, "US", Pence::from(0), Pence::from(0)).unwrap_err();
        assert!(matches!(err, PricingError::ShippingUnavailable { method: ShippingMethod::Express, .. }));
    }

    #[test]
    fn discount_cannot_push_the_total_negative() {
        let p = product(4, "STICKER", 300, 50);
        let items = vec![cart_line(&p, 1, 300)];
        let err =
            price_cart(&items, ShippingMethod::Collection, "GB", Pence::from(0), Pence::from(500)).unwrap_err();
        assert_eq!(err, PricingError::NegativeTotal(Pence::from(-200)));
        // An exact wipe-out is fine
        let quote = price_cart(&items, ShippingMethod::Collection, "GB", Pence::from(0), Pence::from(300))
            .expect("quote failed");
        assert_eq!(quote.total, Pence::from(0));
    }

    #[test]
    fn empty_cart_cannot_be_quoted() {
        let err = price_cart(&[], ShippingMethod::Standard, "GB", Pence::from(0), Pence::from(0)).unwrap_err();
        assert_eq!(err, PricingError::EmptyCart);
    }
}
