use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, App};
use serde_json::json;
use spg_common::Secret;
use storefront_payment_engine::{
    db_types::OrderLocator,
    events::EventProducers,
    traits::PaymentEventOutcome,
    OrderFlowApi,
};

use super::{helpers::sample_order, mocks::MockCommerceDb};
use crate::{
    helpers::calculate_hmac,
    middleware::HmacMiddlewareFactory,
    webhook_routes::{monero_webhook, MONERO_SIGNATURE_HEADER},
};

const WEBHOOK_SECRET: &str = "watcher-signing-key";

fn notification_body() -> String {
    json!({
        "event": "payment_confirmation",
        "address": "87zYhsjy3h",
        "txid": "8b3e4f2d",
        "amount": 274_725_000_000_i64,
        "confirmations": 2
    })
    .to_string()
}

async fn post_webhook(signature: Option<String>, outcome: PaymentEventOutcome) -> Result<(StatusCode, String), String> {
    let mut db = MockCommerceDb::new();
    db.expect_apply_payment_event().return_once(move |_| Ok(outcome));
    let api = OrderFlowApi::new(db, EventProducers::default());
    let resource = web::resource("/webhook/monero")
        .route(web::post().to(monero_webhook::<MockCommerceDb>))
        .wrap(HmacMiddlewareFactory::new(MONERO_SIGNATURE_HEADER, Secret::new(WEBHOOK_SECRET.to_string()), true));
    let app = App::new().app_data(web::Data::new(api)).service(resource);
    let service = test::init_service(app).await;
    let body = notification_body();
    let mut req = TestRequest::post()
        .uri("/webhook/monero")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.clone());
    if let Some(sig) = signature {
        req = req.insert_header((MONERO_SIGNATURE_HEADER, sig));
    }
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

#[actix_web::test]
async fn signed_notifications_are_applied_and_acknowledged() {
    let _ = env_logger::try_init().ok();
    let signature = calculate_hmac(WEBHOOK_SECRET, notification_body().as_bytes());
    let outcome = PaymentEventOutcome::Applied { order: sample_order(), settled: true };
    let (status, body) = post_webhook(Some(signature), outcome).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"received\":true"), "{body}");
}

#[actix_web::test]
async fn unsigned_notifications_are_rejected() {
    let _ = env_logger::try_init().ok();
    let outcome = PaymentEventOutcome::Stale(sample_order());
    let err = post_webhook(None, outcome).await.expect_err("Expected error");
    assert_eq!(err, "No HMAC signature found.");
}

#[actix_web::test]
async fn a_forged_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let forged = calculate_hmac("not-the-key", notification_body().as_bytes());
    let outcome = PaymentEventOutcome::Stale(sample_order());
    let err = post_webhook(Some(forged), outcome).await.expect_err("Expected error");
    assert_eq!(err, "Invalid HMAC signature.");
}

#[actix_web::test]
async fn notifications_matching_nothing_are_still_acknowledged() {
    let _ = env_logger::try_init().ok();
    let signature = calculate_hmac(WEBHOOK_SECRET, notification_body().as_bytes());
    let outcome = PaymentEventOutcome::UnknownOrder(OrderLocator::ReceivingAddress("87zYhsjy3h".to_string()));
    let (status, body) = post_webhook(Some(signature), outcome).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"received\":true"), "{body}");
    assert!(body.contains("No matching payment."), "{body}");
}

#[actix_web::test]
async fn replayed_notifications_are_acknowledged_without_effect() {
    let _ = env_logger::try_init().ok();
    let signature = calculate_hmac(WEBHOOK_SECRET, notification_body().as_bytes());
    let outcome = PaymentEventOutcome::Stale(sample_order());
    let (status, body) = post_webhook(Some(signature), outcome).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("stale"), "{body}");
}
