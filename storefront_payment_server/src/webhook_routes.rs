//----------------------------------------------   Webhooks  ----------------------------------------------------
//
// The rails retry webhook deliveries until they see a 2xx, so these handlers always acknowledge:
// an unmatched or unprocessable notification is logged and answered with `{"received": true}`
// like any other, never an error status. Authenticity is enforced before the handler runs, by
// the HMAC middleware wrapped around each resource.

use actix_web::{web, HttpRequest, HttpResponse};
use log::*;
use payment_rails::{bitcoin::BtcPayNotification, monero::MoneroPaymentNotification};
use storefront_payment_engine::{
    traits::{CommerceDatabase, PaymentEventOutcome},
    OrderFlowApi,
};

use crate::{data_objects::WebhookAck, integrations};

pub const MONERO_SIGNATURE_HEADER: &str = "x-monero-signature";
pub const BTC_SIGNATURE_HEADER: &str = "x-processor-signature";

/// Receives wallet watcher notifications for the confirmation-based rail.
///
/// Registered manually (not via `route!`) because each webhook resource carries its own HMAC
/// middleware, keyed to its sender.
pub async fn monero_webhook<B: CommerceDatabase>(
    req: HttpRequest,
    body: web::Json<MoneroPaymentNotification>,
    api: web::Data<OrderFlowApi<B>>,
) -> HttpResponse {
    trace!("🪝️ Received webhook request: {}", req.uri());
    let event = integrations::monero::payment_event_from_notification(body.into_inner());
    let result = process_event(event, &api).await;
    HttpResponse::Ok().json(result)
}

/// Receives processor notifications for the processor-asserted rail.
pub async fn bitcoin_webhook<B: CommerceDatabase>(
    req: HttpRequest,
    body: web::Json<BtcPayNotification>,
    api: web::Data<OrderFlowApi<B>>,
) -> HttpResponse {
    trace!("🪝️ Received webhook request: {}", req.uri());
    let event = integrations::bitcoin::payment_event_from_notification(body.into_inner());
    let result = process_event(event, &api).await;
    HttpResponse::Ok().json(result)
}

async fn process_event<B: CommerceDatabase>(
    event: storefront_payment_engine::db_types::PaymentEvent,
    api: &OrderFlowApi<B>,
) -> WebhookAck {
    let locator = event.locator.clone();
    match api.process_payment_event(event).await {
        Ok(PaymentEventOutcome::Applied { order, settled }) => {
            if settled {
                info!("🪝️ Payment for order {} has settled.", order.order_number);
            } else {
                debug!("🪝️ Payment progress recorded for order {}.", order.order_number);
            }
            WebhookAck::received("Event applied.")
        },
        Ok(PaymentEventOutcome::AlreadySettled(order)) => {
            debug!("🪝️ Event for order {} arrived after settlement. Nothing to do.", order.order_number);
            WebhookAck::received("Payment already settled.")
        },
        Ok(PaymentEventOutcome::Stale(order)) => {
            debug!("🪝️ Stale or replayed event for order {}. Nothing to do.", order.order_number);
            WebhookAck::received("Event is stale.")
        },
        Ok(PaymentEventOutcome::Ignored(kind)) => {
            info!("🪝️ Unrecognized event kind {kind} for {locator}. Acknowledged and ignored.");
            WebhookAck::received("Event ignored.")
        },
        Ok(PaymentEventOutcome::UnknownOrder(locator)) => {
            warn!("🪝️ No payment record matches {locator}. Acknowledged; nothing recorded.");
            WebhookAck::received("No matching payment.")
        },
        Err(e) => {
            warn!("🪝️ Could not process event for {locator}. {e}");
            WebhookAck::received(format!("Event could not be processed: {e}"))
        },
    }
}
