//! Stage 4: the request language.

use super::{Middleware, Next};
use crate::error::BoxError;
use crate::exchange::Exchange;
use crate::handler::BoxFuture;
use crate::locale::LANGUAGE_HEADER;

/// Activates the language named by `X-Language`, or the default one.
/// Never fails and never stops the chain.
pub(crate) struct ResolveLocale;

impl Middleware for ResolveLocale {
    fn name(&self) -> &'static str {
        "locale"
    }

    fn process<'a>(&'a self, mut exchange: Exchange, next: Next<'a>) -> BoxFuture<'a, Result<(), BoxError>> {
        match exchange.request.header(LANGUAGE_HEADER).map(str::to_owned) {
            Some(tag) => exchange.locale.set_language(&tag),
            None => exchange.locale.init_default(),
        }
        next.run(exchange)
    }
}
