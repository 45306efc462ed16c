//! API-key middleware.
//!
//! Storefront and admin clients authenticate with a shared key in the `spg-api-key` header. The
//! comparison is constant-time. Webhook endpoints do not use this; they are authenticated by
//! their HMAC signature instead.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use spg_common::Secret;
use subtle::ConstantTimeEq;

pub const API_KEY_HEADER: &str = "spg-api-key";

pub struct ApiKeyMiddlewareFactory {
    key: Secret<String>,
}

impl ApiKeyMiddlewareFactory {
    pub fn new(key: Secret<String>) -> Self {
        ApiKeyMiddlewareFactory { key }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = ApiKeyMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyMiddlewareService { key: self.key.clone(), service: Rc::new(service) }))
    }
}

pub struct ApiKeyMiddlewareService<S> {
    key: Secret<String>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let expected = self.key.reveal().clone();
        Box::pin(async move {
            let provided = req.headers().get(API_KEY_HEADER).and_then(|v| v.to_str().ok()).unwrap_or_default();
            let valid =
                !expected.is_empty() && bool::from(expected.as_bytes().ct_eq(provided.as_bytes()));
            if valid {
                trace!("🔐️ API key accepted");
                service.call(req).await
            } else {
                warn!("🔐️ Missing or invalid API key. Denying access.");
                Err(ErrorUnauthorized("Missing or invalid API key."))
            }
        })
    }
}
