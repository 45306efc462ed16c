use std::{
    future::Future,
    pin::Pin,
    sync::{atomic::AtomicI32, Arc},
    time::Duration,
};

use log::*;
use spg_common::{Pence, RailType};
use storefront_payment_engine::{
    db_types::{Address, CheckoutRequest, NewPayment, NewProduct, NewRefund, ShippingMethod},
    events::{EventHandlers, EventHooks},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    OrderFlowApi,
    RefundApi,
    SqliteDatabase,
};
use tokio::runtime::Runtime;

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    pub fn called(&self) {
        let _ = self.called.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn count(&self) -> i32 {
        self.called.load(std::sync::atomic::Ordering::Relaxed)
    }
}

async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

fn checkout_request(customer_id: &str) -> CheckoutRequest {
    CheckoutRequest {
        customer_id: customer_id.into(),
        email: format!("{customer_id}@example.com"),
        address: Address {
            recipient: "Bob Woolly".into(),
            line1: "3 The Green".into(),
            line2: None,
            city: "Norwich".into(),
            postcode: "NR1 1AA".into(),
            country: "GB".into(),
        },
        shipping_method: ShippingMethod::Standard,
        tax: Pence::from(0),
        discount: Pence::from(0),
        expected_total: None,
    }
}

async fn wait_for(hook: &HookCalled, expected: i32) {
    for _ in 0..50 {
        if hook.count() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("hook was called {} times, expected {expected}", hook.count());
}

#[test]
fn paid_and_refunded_hooks_fire_after_commit() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    let paid = HookCalled::default();
    let refunded = HookCalled::default();
    let paid_copy = paid.clone();
    let refunded_copy = refunded.clone();
    let paid_in = paid.clone();
    let refunded_in = refunded.clone();
    rt.block_on(async move {
        let mut hooks = EventHooks::default();
        hooks.on_order_paid(move |ev| {
            info!("🪝️ Order paid: {}", ev.order.order_number);
            paid_copy.called();
            Box::pin(async {}) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        hooks.on_order_refunded(move |ev| {
            info!("🪝️ Order refunded: {} ({})", ev.order.order_number, ev.refund.amount);
            refunded_copy.called();
            Box::pin(async {}) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        let handlers = EventHandlers::new(10, hooks);
        let producers = handlers.producers();
        handlers.start_handlers().await;

        let db = setup().await;
        let tee = db.upsert_product(NewProduct::new("TEE-BLK-M", "Black tee (M)", Pence::from(1999), 5)).await.unwrap();
        db.add_to_cart("alice", &tee, 1).await.unwrap();
        let flow = OrderFlowApi::new(db.clone(), producers.clone());
        let refund_api = RefundApi::new(db.clone(), producers);

        // £19.99 + £4.95 shipping, captured up front: the paid hook fires off the checkout itself
        let payment = NewPayment::settled(RailType::PayPal, Pence::from(2494), "CAP-90".into());
        let order = flow.checkout(checkout_request("alice"), payment).await.expect("Error checking out");
        wait_for(&paid_in, 1).await;

        let refund = NewRefund {
            order_number: order.order_number,
            amount: Pence::from(500),
            reason: Some("goodwill".into()),
            actor: "admin:jane".into(),
            external_ref: None,
        };
        refund_api.record_refund(refund).await.expect("Error recording refund");
        wait_for(&refunded_in, 1).await;
    });
    assert_eq!(paid.count(), 1);
    assert_eq!(refunded.count(), 1);
    info!("🪝️ test complete");
}
