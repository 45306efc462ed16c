//! Concurrency tests for the two conditional-update guards: stock decrements at checkout and the
//! cumulative refund cap. A single-connection pool lets the tasks genuinely interleave at
//! transaction granularity while keeping SQLite happy.
use log::*;
use spg_common::{Pence, RailType};
use storefront_payment_engine::{
    db_types::{Address, CheckoutRequest, NewPayment, NewProduct, NewRefund, RefundStatus, ShippingMethod},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{CommerceDatabase, CommerceError, OrderManagement},
    OrderFlowApi,
    RefundApi,
    SqliteDatabase,
};
use tokio::runtime::Runtime;

fn checkout_request(customer_id: &str) -> CheckoutRequest {
    CheckoutRequest {
        customer_id: customer_id.into(),
        email: format!("{customer_id}@example.com"),
        address: Address {
            recipient: "Cass Hyde".into(),
            line1: "9 Mill Road".into(),
            line2: None,
            city: "Cambridge".into(),
            postcode: "CB1 2AD".into(),
            country: "GB".into(),
        },
        shipping_method: ShippingMethod::Standard,
        tax: Pence::from(0),
        discount: Pence::from(0),
        expected_total: None,
    }
}

#[test]
fn last_units_go_to_exactly_as_many_buyers() {
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating database");

        const STOCK: i64 = 3;
        const BUYERS: usize = 8;
        let tee = db.upsert_product(NewProduct::new("TEE-BLK-M", "Black tee (M)", Pence::from(1999), STOCK)).await.unwrap();
        for i in 0..BUYERS {
            db.add_to_cart(&format!("buyer-{i}"), &tee, 1).await.unwrap();
        }

        info!("🚀️ {BUYERS} buyers racing for {STOCK} units");
        let mut handles = Vec::with_capacity(BUYERS);
        for i in 0..BUYERS {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                let api = OrderFlowApi::new(db, EventProducers::default());
                // £19.99 + £4.95 shipping
                let payment = NewPayment::settled(RailType::PayPal, Pence::from(2494), format!("CAP-{i}"));
                api.checkout(checkout_request(&format!("buyer-{i}")), payment).await
            }));
        }
        let mut successes = 0;
        for handle in handles {
            match handle.await.expect("checkout task panicked") {
                Ok(order) => {
                    debug!("🚀️ {} won a unit", order.customer_id);
                    successes += 1;
                },
                Err(CommerceError::StockRaceLost { .. }) | Err(CommerceError::PricingError(_)) => {},
                Err(e) => panic!("unexpected checkout error: {e}"),
            }
        }
        assert_eq!(successes, STOCK);
        let tee = db.fetch_product_by_sku("TEE-BLK-M").await.unwrap().unwrap();
        assert_eq!(tee.stock, 0);
    });
    info!("🚀️ test complete");
}

#[test]
fn concurrent_refunds_cannot_jointly_exceed_the_total() {
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating database");

        let tee = db.upsert_product(NewProduct::new("TEE-BLK-M", "Black tee (M)", Pence::from(1000), 10)).await.unwrap();
        db.add_to_cart("buyer-0", &tee, 4).await.unwrap();
        let flow = OrderFlowApi::new(db.clone(), EventProducers::default());
        // 4 × £10.00 + £4.95 shipping
        let total = Pence::from(4495);
        let payment = NewPayment::settled(RailType::PayPal, total, "CAP-100".into());
        let order = flow.checkout(checkout_request("buyer-0"), payment).await.expect("Error checking out");

        info!("🚀️ Six agents racing to refund £10 each from a £44.95 order");
        let mut handles = Vec::new();
        for i in 0..6 {
            let db = db.clone();
            let number = order.order_number.clone();
            handles.push(tokio::spawn(async move {
                let api = RefundApi::new(db, EventProducers::default());
                let refund = NewRefund {
                    order_number: number,
                    amount: Pence::from(1000),
                    reason: Some(format!("duplicate charge claim {i}")),
                    actor: format!("admin:{i}"),
                    external_ref: None,
                };
                api.record_refund(refund).await
            }));
        }
        let mut successes = 0;
        for handle in handles {
            match handle.await.expect("refund task panicked") {
                Ok(_) => successes += 1,
                Err(CommerceError::OverRefund { .. }) => {},
                Err(e) => panic!("unexpected refund error: {e}"),
            }
        }
        // Only four £10 refunds fit under the £44.95 cap
        assert_eq!(successes, 4);
        let full = db.fetch_full_order(&order.order_number).await.unwrap().unwrap();
        assert_eq!(full.order.total_refunded, Pence::from(4000));
        assert_eq!(full.order.refund_status, RefundStatus::PartialRefunded);
        assert_eq!(full.refunds.len(), 4);

        // The remainder still refunds cleanly and closes the order out
        let api = RefundApi::new(db.clone(), EventProducers::default());
        let refund = NewRefund {
            order_number: order.order_number.clone(),
            amount: Pence::from(495),
            reason: Some("remainder".into()),
            actor: "admin:jane".into(),
            external_ref: None,
        };
        let (order, _) = api.record_refund(refund).await.expect("Error refunding remainder");
        assert_eq!(order.refund_status, RefundStatus::FullyRefunded);
        assert_eq!(order.total_refunded, order.total);
    });
    info!("🚀️ test complete");
}
