use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use serde_json::json;
use spg_common::{Pence, RailType};
use storefront_payment_engine::{
    db_types::{OrderStatusType, PaymentRecord, PaymentStatus, RefundEntry, RefundEntryStatus},
    events::EventProducers,
    order_objects::FullOrder,
    traits::CommerceError,
    CommerceQueryApi,
    OrderFlowApi,
    RefundApi,
};

use super::{
    helpers::{call_with_key, sample_order, TEST_API_KEY},
    mocks::MockCommerceDb,
};
use crate::routes::{RefundOrderRoute, SearchOrdersRoute, UpdateOrderStatusRoute};

#[actix_web::test]
async fn admins_can_ship_a_processing_order() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "new_status": "Shipped", "actor": "admin:joan", "reason": "dispatched with tracking" });
    let req = TestRequest::post().uri("/order/SO-20260824-4F7K2Q/status").set_json(&body);
    let (status, body) = call_with_key(TEST_API_KEY, req, configure_status_update).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"status\":\"Shipped\""), "{body}");
}

#[actix_web::test]
async fn forbidden_transitions_surface_as_a_400() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "new_status": "Delivered", "actor": "admin:joan" });
    let req = TestRequest::post().uri("/order/SO-20260824-4F7K2Q/status").set_json(&body);
    let (status, body) =
        call_with_key(TEST_API_KEY, req, configure_forbidden_transition).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("cannot change from Pending to Delivered"), "{body}");
}

#[actix_web::test]
async fn order_searches_pass_the_filter_through() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/orders?customer_id=cust-1001");
    let (status, body) = call_with_key(TEST_API_KEY, req, configure_search).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("SO-20260824-4F7K2Q"), "{body}");
}

#[actix_web::test]
async fn crypto_refunds_are_recorded_with_the_ops_reference() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "amount": 1000,
        "reason": "damaged in transit",
        "actor": "admin:joan",
        "external_ref": "payout-2026-081"
    });
    let req = TestRequest::post().uri("/order/SO-20260824-4F7K2Q/refund").set_json(&body);
    let (status, body) = call_with_key(TEST_API_KEY, req, configure_refund).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("payout-2026-081"), "{body}");
}

#[actix_web::test]
async fn over_refunds_are_rejected() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "amount": 10_000, "reason": "goodwill", "actor": "admin:joan" });
    let req = TestRequest::post().uri("/order/SO-20260824-4F7K2Q/refund").set_json(&body);
    let (status, body) = call_with_key(TEST_API_KEY, req, configure_over_refund).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("exceeds the refundable remainder"), "{body}");
}

fn monero_payment_record() -> PaymentRecord {
    PaymentRecord {
        id: 7,
        order_id: 1,
        rail: RailType::Monero,
        status: PaymentStatus::Completed,
        target_amount: 274_725_000_000,
        amount_received: 274_725_000_000,
        confirmations: Some(2),
        receiving_address: Some("87zYhsjy3h".to_string()),
        external_ref: None,
        last_txid: Some("8b3e4f2d".to_string()),
        descriptor: None,
        expires_at: None,
        created_at: Utc.with_ymd_and_hms(2026, 8, 24, 10, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2026, 8, 24, 11, 0, 0).unwrap(),
    }
}

fn refund_entry(external_ref: Option<&str>) -> RefundEntry {
    RefundEntry {
        id: 1,
        order_id: 1,
        amount: Pence::from(1000),
        reason: Some("damaged in transit".to_string()),
        actor: "admin:joan".to_string(),
        status: RefundEntryStatus::Succeeded,
        external_ref: external_ref.map(String::from),
        created_at: Utc.with_ymd_and_hms(2026, 8, 24, 12, 0, 0).unwrap(),
    }
}

fn configure_status_update(cfg: &mut ServiceConfig) {
    let mut db = MockCommerceDb::new();
    db.expect_update_order_status().returning(|_, new_status, _, _| {
        let mut order = sample_order();
        order.status = new_status;
        Ok(order)
    });
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.service(UpdateOrderStatusRoute::<MockCommerceDb>::new()).app_data(web::Data::new(api));
}

fn configure_forbidden_transition(cfg: &mut ServiceConfig) {
    let mut db = MockCommerceDb::new();
    db.expect_update_order_status().returning(|_, new_status, _, _| {
        Err(CommerceError::StatusChangeForbidden { from: OrderStatusType::Pending, to: new_status })
    });
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.service(UpdateOrderStatusRoute::<MockCommerceDb>::new()).app_data(web::Data::new(api));
}

fn configure_search(cfg: &mut ServiceConfig) {
    let mut db = MockCommerceDb::new();
    db.expect_search_orders().returning(|query| {
        assert_eq!(query.customer_id.as_deref(), Some("cust-1001"));
        Ok(vec![sample_order()])
    });
    let api = CommerceQueryApi::new(db);
    cfg.service(SearchOrdersRoute::<MockCommerceDb>::new()).app_data(web::Data::new(api));
}

fn full_monero_order() -> FullOrder {
    FullOrder {
        order: sample_order(),
        items: vec![],
        payment: Some(monero_payment_record()),
        refunds: vec![],
        history: vec![],
    }
}

fn configure_refund(cfg: &mut ServiceConfig) {
    let mut query_db = MockCommerceDb::new();
    query_db.expect_fetch_full_order().returning(|_| Ok(Some(full_monero_order())));
    let mut refund_db = MockCommerceDb::new();
    refund_db.expect_record_refund().returning(|refund| {
        let entry = refund_entry(refund.external_ref.as_deref());
        let mut order = sample_order();
        order.total_refunded = refund.amount;
        Ok((order, entry))
    });
    let refund_api = RefundApi::new(refund_db, EventProducers::default());
    let query_api = CommerceQueryApi::new(query_db);
    let paypal = payment_rails::paypal::PayPalApi::new(Default::default()).unwrap();
    cfg.service(RefundOrderRoute::<MockCommerceDb>::new())
        .app_data(web::Data::new(refund_api))
        .app_data(web::Data::new(query_api))
        .app_data(web::Data::new(paypal));
}

fn configure_over_refund(cfg: &mut ServiceConfig) {
    let mut query_db = MockCommerceDb::new();
    query_db.expect_fetch_full_order().returning(|_| Ok(Some(full_monero_order())));
    let mut refund_db = MockCommerceDb::new();
    refund_db.expect_record_refund().returning(|refund| {
        Err(CommerceError::OverRefund { requested: refund.amount, refundable: Pence::from(4493) })
    });
    let refund_api = RefundApi::new(refund_db, EventProducers::default());
    let query_api = CommerceQueryApi::new(query_db);
    let paypal = payment_rails::paypal::PayPalApi::new(Default::default()).unwrap();
    cfg.service(RefundOrderRoute::<MockCommerceDb>::new())
        .app_data(web::Data::new(refund_api))
        .app_data(web::Data::new(query_api))
        .app_data(web::Data::new(paypal));
}
