//! HMAC middleware for Actix Web.
//!
//! The payment gateway signs every webhook delivery: an HMAC-SHA256 digest of the raw request
//! body, hex-encoded, in the `x-gateway-signature` header. This middleware checks that signature
//! before the body ever reaches a handler, and re-injects the consumed payload so the handler can
//! still deserialize it.
//!
//! The signing secret and the on/off switch come from the [`GatewayConfig`] registered as app
//! data; a route wrapped with this middleware on a server without that config rejects everything.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorInternalServerError, ErrorUnauthorized},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{error, trace, warn};

use crate::{config::GatewayConfig, helpers::verify_hmac};

pub const GATEWAY_SIGNATURE_HEADER: &str = "x-gateway-signature";

#[derive(Default)]
pub struct HmacMiddlewareFactory;

impl HmacMiddlewareFactory {
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for HmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = HmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HmacMiddlewareService { service: Rc::new(service) }))
    }
}

pub struct HmacMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for HmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let config = req.app_data::<web::Data<GatewayConfig>>().cloned();
        Box::pin(async move {
            trace!("🔐️ Checking HMAC for request");
            let config = config.ok_or_else(|| {
                error!("🔐️ No gateway configuration registered on the server. Denying the signed route call.");
                ErrorInternalServerError("Server is not configured for signed requests.")
            })?;
            if !config.hmac_checks {
                trace!("🔐️ HMAC checks are disabled. Allowing request.");
                return service.call(req).await;
            }
            let provided = req
                .headers()
                .get(GATEWAY_SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
                .ok_or_else(|| {
                    warn!("🔐️ No gateway signature found in request. Denying access.");
                    ErrorUnauthorized("No gateway signature found.")
                })?;
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ErrorBadRequest("Failed to extract request data.")
            })?;
            if verify_hmac(config.webhook_secret.reveal(), data.as_ref(), &provided) {
                trace!("🔐️ HMAC check for request ✅️");
                req.set_payload(bytes_to_payload(data));
                service.call(req).await
            } else {
                warn!("🔐️ Invalid gateway signature found in request. Denying access.");
                Err(ErrorUnauthorized("Invalid gateway signature."))
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
