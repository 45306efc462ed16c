use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use spg_common::RailType;
use storefront_payment_engine::{
    db_types::OrderNumber,
    events::EventProducers,
    order_objects::PaymentStatusView,
    traits::CommerceError,
    OrderFlowApi,
};

use super::{
    helpers::{call_with_key, TEST_API_KEY},
    mocks::MockCommerceDb,
};
use crate::routes::PaymentStatusRoute;

#[actix_web::test]
async fn payment_status_returns_the_snapshot() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/order/SO-20260824-4F7K2Q/status");
    let (status, body) = call_with_key(TEST_API_KEY, req, configure_status).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, STATUS_JSON);
}

#[actix_web::test]
async fn unknown_orders_are_a_404() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/order/SO-00000000-XXXXXX/status");
    let (status, body) = call_with_key(TEST_API_KEY, req, configure_missing).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("does not exist"), "{body}");
}

#[actix_web::test]
async fn requests_without_the_api_key_are_unauthorized() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/order/SO-20260824-4F7K2Q/status");
    let err = call_with_key("", req, configure_status).await.expect_err("Expected error");
    assert_eq!(err, "Missing or invalid API key.");
}

#[actix_web::test]
async fn a_wrong_api_key_is_also_unauthorized() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/order/SO-20260824-4F7K2Q/status");
    let err = call_with_key("not-the-key", req, configure_status).await.expect_err("Expected error");
    assert_eq!(err, "Missing or invalid API key.");
}

fn status_view() -> PaymentStatusView {
    PaymentStatusView {
        order_number: "SO-20260824-4F7K2Q".to_string(),
        rail: RailType::Monero,
        payment_status: storefront_payment_engine::db_types::PaymentStatus::AwaitingConfirmation,
        confirmations: Some(1),
        amount_received: 274_725_000_000,
        target_amount: 274_725_000_000,
        is_expired: false,
        expires_at: None,
    }
}

fn configure_status(cfg: &mut ServiceConfig) {
    let mut db = MockCommerceDb::new();
    db.expect_payment_status().returning(|_| Ok(status_view()));
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.service(PaymentStatusRoute::<MockCommerceDb>::new()).app_data(web::Data::new(api));
}

fn configure_missing(cfg: &mut ServiceConfig) {
    let mut db = MockCommerceDb::new();
    db.expect_payment_status()
        .returning(|number: &OrderNumber| Err(CommerceError::OrderNotFound(number.clone())));
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.service(PaymentStatusRoute::<MockCommerceDb>::new()).app_data(web::Data::new(api));
}

const STATUS_JSON: &str = r#"{"order_number":"SO-20260824-4F7K2Q","rail":"monero","payment_status":"AwaitingConfirmation","confirmations":1,"amount_received":274725000000,"target_amount":274725000000,"is_expired":false,"expires_at":null}"#;
