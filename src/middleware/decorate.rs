//! Stage 2: standard response headers.
//!
//! The caller's `Origin` is echoed back with credentials allowed. A tighter
//! cross-origin policy belongs in front of the service.

use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE, ORIGIN, VARY,
};
use http::{HeaderMap, HeaderValue};

use super::{Middleware, Next};
use crate::error::BoxError;
use crate::exchange::Exchange;
use crate::handler::BoxFuture;
use crate::response::Responder;

/// Request headers a browser may send cross-origin.
const ALLOWED_REQUEST_HEADERS: &str = "Origin, Content-Type, Authorization, X-Language";

/// Sets the JSON content type and the cross-origin headers every response
/// carries. Also used by the discovery, fallback and not-found responders.
pub(crate) fn apply_cors(responder: &Responder, request_headers: &HeaderMap) {
    responder.set_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(origin) = request_headers.get(ORIGIN) {
        responder.set_header(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    }
    responder.set_header(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
    responder.set_header(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_REQUEST_HEADERS),
    );
    responder.set_header(VARY, HeaderValue::from_static("Origin"));
}

pub(crate) struct Decorate;

impl Middleware for Decorate {
    fn name(&self) -> &'static str {
        "decorate"
    }

    fn process<'a>(&'a self, exchange: Exchange, next: Next<'a>) -> BoxFuture<'a, Result<(), BoxError>> {
        apply_cors(&exchange.responder, &exchange.request.headers);
        next.run(exchange)
    }
}
