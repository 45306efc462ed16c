use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::info;
use payment_rails::{bitcoin::BitcoinProcessorApi, monero::MoneroWalletApi, paypal::PayPalApi};
use storefront_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    CommerceQueryApi,
    ExchangeRateApi,
    OrderFlowApi,
    RefundApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    middleware::{ApiKeyMiddlewareFactory, HmacMiddlewareFactory},
    routes::{
        health,
        CheckoutBitcoinRoute,
        CheckoutMoneroRoute,
        CheckoutPaypalCaptureRoute,
        CheckoutPaypalCreateRoute,
        FullOrderRoute,
        GetExchangeRateRoute,
        PaymentStatusRoute,
        PaymentWindow,
        RefundOrderRoute,
        ReissuePaymentRoute,
        SearchOrdersRoute,
        SetExchangeRateRoute,
        UpdateOrderStatusRoute,
    },
    webhook_routes::{bitcoin_webhook, monero_webhook, BTC_SIGNATURE_HEADER, MONERO_SIGNATURE_HEADER},
};

pub const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, default_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::InitializeError(e.to_string()))
}

fn default_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|event| {
        Box::pin(async move {
            info!("📬️ Order {} is paid and ready for fulfilment.", event.order.order_number);
        })
    });
    hooks.on_order_refunded(|event| {
        Box::pin(async move {
            info!("📬️ Refund of {} recorded against order {}.", event.refund.amount, event.order.order_number);
        })
    });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let paypal = PayPalApi::new(config.paypal.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let wallet = MoneroWalletApi::new(config.monero.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let processor =
        BitcoinProcessorApi::new(config.btc.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let flow_api = OrderFlowApi::new(db.clone(), producers.clone());
        let refund_api = RefundApi::new(db.clone(), producers.clone());
        let query_api = CommerceQueryApi::new(db.clone());
        let fx_api = ExchangeRateApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("spg::access_log"))
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(refund_api))
            .app_data(web::Data::new(query_api))
            .app_data(web::Data::new(fx_api))
            .app_data(web::Data::new(paypal.clone()))
            .app_data(web::Data::new(wallet.clone()))
            .app_data(web::Data::new(processor.clone()))
            .app_data(web::Data::new(PaymentWindow(config.payment_window)));
        // The storefront and admin surfaces share the API key; webhooks authenticate by HMAC.
        let store_scope = web::scope("")
            .wrap(ApiKeyMiddlewareFactory::new(config.api_key.clone()))
            .service(CheckoutPaypalCreateRoute::<SqliteDatabase>::new())
            .service(CheckoutPaypalCaptureRoute::<SqliteDatabase>::new())
            .service(CheckoutMoneroRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(CheckoutBitcoinRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(PaymentStatusRoute::<SqliteDatabase>::new())
            .service(ReissuePaymentRoute::<SqliteDatabase, SqliteDatabase>::new());
        let admin_scope = web::scope("/api")
            .wrap(ApiKeyMiddlewareFactory::new(config.api_key.clone()))
            .service(SearchOrdersRoute::<SqliteDatabase>::new())
            .service(FullOrderRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(RefundOrderRoute::<SqliteDatabase>::new())
            .service(SetExchangeRateRoute::<SqliteDatabase>::new())
            .service(GetExchangeRateRoute::<SqliteDatabase>::new());
        let monero_hook = web::resource("/webhook/monero")
            .route(web::post().to(monero_webhook::<SqliteDatabase>))
            .wrap(HmacMiddlewareFactory::new(
                MONERO_SIGNATURE_HEADER,
                config.monero_webhook_secret.clone(),
                config.hmac_checks,
            ));
        let bitcoin_hook = web::resource("/webhook/bitcoin")
            .route(web::post().to(bitcoin_webhook::<SqliteDatabase>))
            .wrap(HmacMiddlewareFactory::new(
                BTC_SIGNATURE_HEADER,
                config.btc_webhook_secret.clone(),
                config.hmac_checks,
            ));
        app.service(health).service(monero_hook).service(bitcoin_hook).service(admin_scope).service(store_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
