//! Stage 3: the action's declared response headers.

use super::{Middleware, Next};
use crate::error::BoxError;
use crate::exchange::Exchange;
use crate::handler::BoxFuture;

/// Copies the matched action's headers onto the response, replacing any
/// standard header of the same name.
pub(crate) struct DeclaredHeaders;

impl Middleware for DeclaredHeaders {
    fn name(&self) -> &'static str {
        "declared_headers"
    }

    fn process<'a>(&'a self, exchange: Exchange, next: Next<'a>) -> BoxFuture<'a, Result<(), BoxError>> {
        for (name, value) in &exchange.action.headers {
            exchange.responder.set_header(name.clone(), value.clone());
        }
        next.run(exchange)
    }
}
