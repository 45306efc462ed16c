use mockall::mock;
use spg_common::Pence;
use storefront_payment_engine::{
    db_types::{
        CartItem,
        CheckoutRequest,
        NewPayment,
        NewRefund,
        Order,
        OrderNumber,
        OrderStatusType,
        PaymentEvent,
        PaymentRecord,
        Product,
        RefundEntry,
        ShippingMethod,
    },
    order_objects::{CartQuote, FullOrder, OrderQueryFilter, PaymentStatusView},
    traits::{
        CommerceDatabase,
        CommerceError,
        ExchangeRateError,
        ExchangeRates,
        OrderApiError,
        OrderManagement,
        PaymentEventOutcome,
    },
    ExchangeRate,
};

mock! {
    pub CommerceDb {}

    impl Clone for CommerceDb {
        fn clone(&self) -> Self;
    }

    impl OrderManagement for CommerceDb {
        async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderApiError>;
        async fn fetch_full_order(&self, number: &OrderNumber) -> Result<Option<FullOrder>, OrderApiError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError>;
        async fn fetch_cart(&self, customer_id: &str) -> Result<Vec<(CartItem, Product)>, OrderApiError>;
        async fn fetch_product_by_sku(&self, sku: &str) -> Result<Option<Product>, OrderApiError>;
    }

    impl CommerceDatabase for CommerceDb {
        fn url(&self) -> &str;
        async fn quote_cart(
            &self,
            customer_id: &str,
            method: ShippingMethod,
            country: &str,
            tax: Pence,
            discount: Pence,
        ) -> Result<CartQuote, CommerceError>;
        async fn checkout(&self, request: CheckoutRequest, payment: NewPayment) -> Result<Order, CommerceError>;
        async fn apply_payment_event(&self, event: PaymentEvent) -> Result<PaymentEventOutcome, CommerceError>;
        async fn payment_status(&self, number: &OrderNumber) -> Result<PaymentStatusView, CommerceError>;
        async fn reissue_payment(&self, number: &OrderNumber, payment: NewPayment) -> Result<PaymentRecord, CommerceError>;
        async fn record_refund(&self, refund: NewRefund) -> Result<(Order, RefundEntry), CommerceError>;
        async fn record_failed_refund(&self, refund: NewRefund) -> Result<RefundEntry, CommerceError>;
        async fn update_order_status<'a>(
            &self,
            number: &OrderNumber,
            new_status: OrderStatusType,
            actor: &str,
            reason: Option<&'a str>,
        ) -> Result<Order, CommerceError>;
        async fn close(&mut self) -> Result<(), CommerceError>;
    }

    impl ExchangeRates for CommerceDb {
        async fn fetch_last_rate(&self, currency: &str) -> Result<ExchangeRate, ExchangeRateError>;
        async fn set_exchange_rate(&self, rate: &ExchangeRate) -> Result<(), ExchangeRateError>;
    }
}
