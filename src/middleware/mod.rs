//! The request pipeline.
//!
//! Every request routed to an action runs the same fixed sequence of stages,
//! assembled once per action at mount time:
//!
//! 1. [`Normalize`]: merge body, query and path parameters into the data map
//! 2. [`Decorate`]: standard JSON and cross-origin response headers
//! 3. [`DeclaredHeaders`]: the action's own response headers (if any)
//! 4. [`ResolveLocale`]: pick the request language from `X-Language`
//! 5. [`Validate`]: filter and validate the data (if the action has a schema)
//! 6. [`Invoke`]: call the handler
//!
//! A stage either passes the exchange on with `next.run(exchange)` or stops
//! the chain by sending a response itself. A stage that returns `Err` stops
//! the chain too; [`Pipeline::run`] then answers 500 if nothing was sent.
//! The order is not configurable.

mod decorate;
mod headers;
mod invoke;
mod locale;
mod normalize;
mod pipeline;
mod validate;

pub(crate) use decorate::{apply_cors, Decorate};
pub(crate) use headers::DeclaredHeaders;
pub(crate) use invoke::Invoke;
pub(crate) use locale::ResolveLocale;
pub(crate) use normalize::Normalize;
pub(crate) use pipeline::Pipeline;
pub(crate) use validate::Validate;

use std::sync::Arc;

use crate::error::BoxError;
use crate::exchange::Exchange;
use crate::handler::BoxFuture;

/// One pipeline stage.
pub(crate) trait Middleware: Send + Sync + 'static {
    /// Stage name, used in logs.
    fn name(&self) -> &'static str;

    fn process<'a>(&'a self, exchange: Exchange, next: Next<'a>) -> BoxFuture<'a, Result<(), BoxError>>;
}

/// The rest of the chain after the current stage.
///
/// Consumed by [`run`](Next::run), so a stage can continue at most once.
pub(crate) struct Next<'a> {
    rest: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(stages: &'a [Arc<dyn Middleware>]) -> Self {
        Self { rest: stages }
    }

    pub(crate) fn run(self, exchange: Exchange) -> BoxFuture<'a, Result<(), BoxError>> {
        match self.rest.split_first() {
            Some((stage, rest)) => stage.process(exchange, Next { rest }),
            None => Box::pin(async { Ok(()) }),
        }
    }
}
