mod hmac;

pub use hmac::{HmacMiddlewareFactory, HmacMiddlewareService, GATEWAY_SIGNATURE_HEADER};
