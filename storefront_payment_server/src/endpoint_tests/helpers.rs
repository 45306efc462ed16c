use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use spg_common::{Pence, Secret};
use storefront_payment_engine::db_types::{Order, OrderNumber, OrderStatusType, PaymentStatus, RefundStatus, ShippingMethod};

use crate::middleware::ApiKeyMiddlewareFactory;

pub const TEST_API_KEY: &str = "test-api-key";

/// Runs `req` against an app configured by `configure`, with every service behind the API-key
/// middleware the way the real server mounts them.
pub async fn call_with_key(
    api_key: &str,
    mut req: TestRequest,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    if !api_key.is_empty() {
        req = req.insert_header(("spg-api-key", api_key));
    }
    let scope =
        web::scope("").wrap(ApiKeyMiddlewareFactory::new(Secret::new(TEST_API_KEY.to_string()))).configure(configure);
    let app = App::new().service(scope);
    let service = test::init_service(app).await;
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

/// A settled card order, two tees and standard shipping.
pub fn sample_order() -> Order {
    Order {
        id: 1,
        order_number: OrderNumber("SO-20260824-4F7K2Q".to_string()),
        customer_id: "cust-1001".to_string(),
        email: "alice@example.com".to_string(),
        recipient: "Alice Jones".to_string(),
        address_line1: "1 High Street".to_string(),
        address_line2: None,
        city: "London".to_string(),
        postcode: "N1 9GU".to_string(),
        country: "GB".to_string(),
        shipping_method: ShippingMethod::Standard,
        subtotal: Pence::from(3998),
        shipping: Pence::from(495),
        tax: Pence::default(),
        discount: Pence::default(),
        total: Pence::from(4493),
        total_refunded: Pence::default(),
        refund_status: RefundStatus::None,
        status: OrderStatusType::Processing,
        payment_status: PaymentStatus::Completed,
        created_at: Utc.with_ymd_and_hms(2026, 8, 24, 10, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2026, 8, 24, 10, 30, 0).unwrap(),
    }
}
