//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (I/O, database calls, rail API
//! calls) must be awaited so that worker threads stay free to handle other requests.

use actix_web::{get, web, HttpResponse, Responder};
use chrono::{Duration, Utc};
use log::*;
use payment_rails::{bitcoin::BitcoinProcessorApi, monero::MoneroWalletApi, paypal::PayPalApi};
use spg_common::{Pence, RailType};
use storefront_payment_engine::{
    db_types::{CheckoutRequest, NewPayment, NewRefund, OrderNumber},
    order_objects::OrderQueryFilter,
    traits::{CommerceDatabase, ExchangeRates, OrderManagement},
    CommerceQueryApi,
    ExchangeRate,
    ExchangeRateApi,
    OrderFlowApi,
    RefundApi,
};

use crate::{
    data_objects::{
        CapturePayload,
        CheckoutPayload,
        ExchangeRateUpdate,
        PaymentInitResponse,
        ProviderOrderResponse,
        RefundRequest,
        ReissueRequest,
        StatusUpdateRequest,
    },
    errors::ServerError,
    integrations,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name);
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// How long a freshly issued crypto payment stays payable. Carried as app data so handlers can
/// stamp expiries without dragging the whole server config around.
#[derive(Clone, Copy, Debug)]
pub struct PaymentWindow(pub Duration);

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------

route!(checkout_paypal_create => Post "/checkout/paypal/create" impl CommerceDatabase);
/// First leg of the immediate-capture flow. The cart is priced and a capture-intent provider
/// order is created for exactly that total; nothing is written to the database yet.
pub async fn checkout_paypal_create<B: CommerceDatabase>(
    body: web::Json<CheckoutPayload>,
    api: web::Data<OrderFlowApi<B>>,
    paypal: web::Data<PayPalApi>,
) -> Result<HttpResponse, ServerError> {
    let payload = body.into_inner();
    debug!("💳️ POST create provider order for customer {}", payload.customer_id);
    let quote = api
        .quote_cart(
            &payload.customer_id,
            payload.shipping_method,
            &payload.address.country,
            payload.tax,
            payload.discount,
        )
        .await?;
    let order = paypal.create_order(quote.total, &payload.customer_id).await?;
    let approval_url = order
        .approve_link()
        .ok_or_else(|| ServerError::RailUnavailable(format!("provider order {} has no approval link", order.id)))?
        .to_string();
    let result = ProviderOrderResponse { provider_order_id: order.id, approval_url, total: quote.total };
    Ok(HttpResponse::Ok().json(result))
}

route!(checkout_paypal_capture => Post "/checkout/paypal/capture" impl CommerceDatabase);
/// Second leg of the immediate-capture flow. The cart is re-priced, the approved provider order
/// is captured for exactly that total, and only then does the checkout transaction run. A capture
/// that completes against a stale cart rolls the checkout back and surfaces as a 400, for ops to
/// reconcile manually.
pub async fn checkout_paypal_capture<B: CommerceDatabase>(
    body: web::Json<CapturePayload>,
    api: web::Data<OrderFlowApi<B>>,
    paypal: web::Data<PayPalApi>,
) -> Result<HttpResponse, ServerError> {
    let CapturePayload { provider_order_id, checkout } = body.into_inner();
    debug!("💳️ POST capture provider order {provider_order_id} for customer {}", checkout.customer_id);
    let quote = api
        .quote_cart(
            &checkout.customer_id,
            checkout.shipping_method,
            &checkout.address.country,
            checkout.tax,
            checkout.discount,
        )
        .await?;
    let capture = paypal.capture_order(&provider_order_id, quote.total).await?;
    let payment = integrations::paypal::settled_payment_from_capture(&capture, quote.total);
    let request = checkout_request(checkout, Some(quote.total));
    let order = api.checkout(request, payment).await?;
    info!("💳️ Capture {} committed as order {}", capture.id, order.order_number);
    Ok(HttpResponse::Ok().json(order))
}

route!(checkout_monero => Post "/checkout/monero" impl CommerceDatabase, ExchangeRates);
/// Prices the cart, converts the total at the latest posted rate, mints a fresh subaddress for
/// the order and commits the checkout with a pending payment. The buyer pays against the returned
/// URI within the payment window.
pub async fn checkout_monero<BPay, BFx>(
    body: web::Json<CheckoutPayload>,
    api: web::Data<OrderFlowApi<BPay>>,
    fx: web::Data<ExchangeRateApi<BFx>>,
    wallet: web::Data<MoneroWalletApi>,
    window: web::Data<PaymentWindow>,
) -> Result<HttpResponse, ServerError>
where
    BPay: CommerceDatabase,
    BFx: ExchangeRates,
{
    let payload = body.into_inner();
    debug!("💳️ POST monero checkout for customer {}", payload.customer_id);
    let quote = api
        .quote_cart(
            &payload.customer_id,
            payload.shipping_method,
            &payload.address.country,
            payload.tax,
            payload.discount,
        )
        .await?;
    let payment = monero_payment_for(quote.total, &payload.customer_id, &fx, &wallet, window.0).await?;
    let response = payment_init_response(&payment);
    let request = checkout_request(payload, Some(quote.total));
    let order = api.checkout(request, payment).await?;
    info!("💳️ Monero checkout committed as order {}", order.order_number);
    Ok(HttpResponse::Ok().json(PaymentInitResponse { order_number: order.order_number.as_str().to_string(), ..response }))
}

route!(checkout_bitcoin => Post "/checkout/bitcoin" impl CommerceDatabase, ExchangeRates);
/// Prices the cart, converts the total at the latest posted rate and asks the processor for a
/// payment request. The processor picks the address and the expiry; its request id is stored so
/// its webhooks can locate the payment.
pub async fn checkout_bitcoin<BPay, BFx>(
    body: web::Json<CheckoutPayload>,
    api: web::Data<OrderFlowApi<BPay>>,
    fx: web::Data<ExchangeRateApi<BFx>>,
    processor: web::Data<BitcoinProcessorApi>,
) -> Result<HttpResponse, ServerError>
where
    BPay: CommerceDatabase,
    BFx: ExchangeRates,
{
    let payload = body.into_inner();
    debug!("💳️ POST bitcoin checkout for customer {}", payload.customer_id);
    let quote = api
        .quote_cart(
            &payload.customer_id,
            payload.shipping_method,
            &payload.address.country,
            payload.tax,
            payload.discount,
        )
        .await?;
    let payment = bitcoin_payment_for(quote.total, &payload.customer_id, &fx, &processor).await?;
    let response = payment_init_response(&payment);
    let request = checkout_request(payload, Some(quote.total));
    let order = api.checkout(request, payment).await?;
    info!("💳️ Bitcoin checkout committed as order {}", order.order_number);
    Ok(HttpResponse::Ok().json(PaymentInitResponse { order_number: order.order_number.as_str().to_string(), ..response }))
}

//----------------------------------------------   Payment status  ----------------------------------------------

route!(payment_status => Get "/order/{order_number}/status" impl CommerceDatabase);
/// The buyer-facing payment snapshot. Reading the status is what evaluates (and persists) the
/// payment-window expiry.
pub async fn payment_status<B: CommerceDatabase>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let number = OrderNumber::from(path.into_inner());
    trace!("💳️ GET payment status for {number}");
    let view = api.payment_status(&number).await?;
    Ok(HttpResponse::Ok().json(view))
}

route!(reissue_payment => Post "/order/{order_number}/reissue" impl CommerceDatabase, ExchangeRates);
/// Issues a fresh payment descriptor, on the requested rail, for an order whose payment never
/// settled. The immediate-capture rail has no descriptor to re-issue; buyers restart that flow
/// from the cart instead.
pub async fn reissue_payment<BPay, BFx>(
    path: web::Path<String>,
    body: web::Json<ReissueRequest>,
    api: web::Data<OrderFlowApi<BPay>>,
    fx: web::Data<ExchangeRateApi<BFx>>,
    wallet: web::Data<MoneroWalletApi>,
    processor: web::Data<BitcoinProcessorApi>,
    window: web::Data<PaymentWindow>,
) -> Result<HttpResponse, ServerError>
where
    BPay: CommerceDatabase,
    BFx: ExchangeRates,
{
    let number = OrderNumber::from(path.into_inner());
    let rail = body.into_inner().rail;
    debug!("💳️ POST reissue payment for {number} on {rail}");
    let order = api
        .db()
        .fetch_order_by_number(&number)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {number} does not exist")))?;
    let payment = match rail {
        RailType::Monero => monero_payment_for(order.total, &order.customer_id, &fx, &wallet, window.0).await?,
        RailType::Bitcoin => bitcoin_payment_for(order.total, &order.customer_id, &fx, &processor).await?,
        RailType::PayPal => {
            return Err(ServerError::InvalidRequestBody(
                "The card rail captures immediately and has no payment descriptor to re-issue".to_string(),
            ))
        },
    };
    let response = payment_init_response(&payment);
    api.reissue_payment(&number, payment).await?;
    info!("💳️ Re-issued payment for {number} on {rail}");
    Ok(HttpResponse::Ok().json(PaymentInitResponse { order_number: number.as_str().to_string(), ..response }))
}

//----------------------------------------------   Admin  --------------------------------------------------------

route!(search_orders => Get "/orders" impl OrderManagement);
pub async fn search_orders<B: OrderManagement>(
    query: web::Query<OrderQueryFilter>,
    api: web::Data<CommerceQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = query.into_inner();
    debug!("📦️ GET search orders: {filter:?}");
    let orders = api.search_orders(filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(full_order => Get "/order/{order_number}" impl OrderManagement);
pub async fn full_order<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<CommerceQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let number = OrderNumber::from(path.into_inner());
    debug!("📦️ GET full order {number}");
    let order = api
        .fetch_full_order(&number)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {number} does not exist")))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Post "/order/{order_number}/status" impl CommerceDatabase);
pub async fn update_order_status<B: CommerceDatabase>(
    path: web::Path<String>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let number = OrderNumber::from(path.into_inner());
    let update = body.into_inner();
    debug!("📦️ POST status change for {number} to {}", update.new_status);
    let order = api.update_order_status(&number, update.new_status, &update.actor, update.reason.as_deref()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(refund_order => Post "/order/{order_number}/refund" impl CommerceDatabase);
/// Executes a refund. For the immediate-capture rail the provider moves the money first; if the
/// provider refuses, the attempt is recorded as failed and the rail error is surfaced. For the
/// crypto rails the payout happens off-system and the caller supplies its reference.
pub async fn refund_order<B: CommerceDatabase>(
    path: web::Path<String>,
    body: web::Json<RefundRequest>,
    api: web::Data<RefundApi<B>>,
    query_api: web::Data<CommerceQueryApi<B>>,
    paypal: web::Data<PayPalApi>,
) -> Result<HttpResponse, ServerError> {
    let number = OrderNumber::from(path.into_inner());
    let request = body.into_inner();
    debug!("🧾️ POST refund {} against {number}", request.amount);
    let full = query_api
        .fetch_full_order(&number)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {number} does not exist")))?;
    let payment =
        full.payment.ok_or_else(|| ServerError::NoRecordFound(format!("Order {number} has no payment record")))?;
    let mut refund = NewRefund {
        order_number: number.clone(),
        amount: request.amount,
        reason: Some(request.reason.clone()),
        actor: request.actor,
        external_ref: request.external_ref,
    };
    if payment.rail == RailType::PayPal {
        let capture_id = payment
            .external_ref
            .as_deref()
            .ok_or_else(|| ServerError::StateConflict(format!("The payment on {number} has no capture reference")))?;
        match paypal.refund_capture(capture_id, request.amount, &request.reason).await {
            Ok(result) => refund.external_ref = Some(result.id),
            Err(e) => {
                warn!("🧾️ Provider rejected refund of {} against {number}. {e}", request.amount);
                api.record_failed_refund(refund).await?;
                return Err(e.into());
            },
        }
    }
    let (order, entry) = api.record_refund(refund).await?;
    info!("🧾️ Refund of {} recorded against {number}. Order is now {}", entry.amount, order.refund_status);
    Ok(HttpResponse::Ok().json(entry))
}

route!(set_exchange_rate => Post "/exchange_rate" impl ExchangeRates);
pub async fn set_exchange_rate<B: ExchangeRates>(
    body: web::Json<ExchangeRateUpdate>,
    api: web::Data<ExchangeRateApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let update = body.into_inner();
    debug!("🪙️ POST update exchange rate for {} to {} per penny", update.currency, update.rate);
    let rate = ExchangeRate::new(update.currency.to_uppercase(), update.rate, None);
    api.set_exchange_rate(&rate).await?;
    Ok(HttpResponse::Ok().finish())
}

route!(get_exchange_rate => Get "/exchange_rate/{currency}" impl ExchangeRates);
pub async fn get_exchange_rate<B: ExchangeRates>(
    path: web::Path<String>,
    api: web::Data<ExchangeRateApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let currency = path.into_inner().to_uppercase();
    debug!("🪙️ GET current exchange rate for {currency}");
    let rate = api.fetch_last_rate(&currency).await?;
    Ok(HttpResponse::Ok().json(rate))
}

//----------------------------------------------   Helpers  -----------------------------------------------------

fn checkout_request(payload: CheckoutPayload, expected_total: Option<Pence>) -> CheckoutRequest {
    CheckoutRequest {
        customer_id: payload.customer_id,
        email: payload.email,
        address: payload.address,
        shipping_method: payload.shipping_method,
        tax: payload.tax,
        discount: payload.discount,
        expected_total,
    }
}

fn payment_init_response(payment: &NewPayment) -> PaymentInitResponse {
    PaymentInitResponse {
        order_number: String::new(),
        rail: payment.rail,
        amount: payment.target_amount,
        address: payment.receiving_address.clone(),
        payment_uri: payment.descriptor.clone(),
        expires_at: payment.expires_at,
    }
}

async fn monero_payment_for<BFx: ExchangeRates>(
    total: Pence,
    label: &str,
    fx: &ExchangeRateApi<BFx>,
    wallet: &MoneroWalletApi,
    window: Duration,
) -> Result<NewPayment, ServerError> {
    let rate = fx.fetch_last_rate(RailType::Monero.currency_code()).await?;
    let target = rate.convert(total);
    let created = wallet.create_address(label).await?;
    let expires_at = Utc::now() + window;
    Ok(integrations::monero::pending_payment(&created, target, expires_at))
}

async fn bitcoin_payment_for<BFx: ExchangeRates>(
    total: Pence,
    reference: &str,
    fx: &ExchangeRateApi<BFx>,
    processor: &BitcoinProcessorApi,
) -> Result<NewPayment, ServerError> {
    let rate = fx.fetch_last_rate(RailType::Bitcoin.currency_code()).await?;
    let target = rate.convert(total);
    let pr = processor.create_payment_request(target, reference).await?;
    Ok(integrations::bitcoin::pending_payment(&pr))
}
