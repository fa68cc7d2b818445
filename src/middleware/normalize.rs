//! Stage 1: build the exchange's data map.

use serde_json::Value;

use super::{Middleware, Next};
use crate::error::BoxError;
use crate::exchange::Exchange;
use crate::handler::BoxFuture;

/// Merges body, query and path parameters, in that order, into
/// `exchange.data`. A later source wins on a shared key, so path parameters
/// always override whatever the client sent under the same name.
pub(crate) struct Normalize;

impl Middleware for Normalize {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn process<'a>(&'a self, mut exchange: Exchange, next: Next<'a>) -> BoxFuture<'a, Result<(), BoxError>> {
        let request = &exchange.request;
        let mut data = request.body.clone();
        data.extend(request.query.iter().map(|(k, v)| (k.clone(), v.clone())));
        data.extend(
            request
                .params
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone()))),
        );
        exchange.data = data;

        next.run(exchange)
    }
}
