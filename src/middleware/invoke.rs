//! Stage 6: the handler.

use super::{Middleware, Next};
use crate::error::BoxError;
use crate::exchange::Exchange;
use crate::handler::{BoxFuture, BoxedHandler};

/// Calls the action's handler on its own task, so a panicking handler ends
/// only its own request. A panic comes back as an `Err` like any other
/// handler failure.
pub(crate) struct Invoke {
    pub(crate) handler: BoxedHandler,
}

impl Middleware for Invoke {
    fn name(&self) -> &'static str {
        "invoke"
    }

    fn process<'a>(&'a self, exchange: Exchange, _next: Next<'a>) -> BoxFuture<'a, Result<(), BoxError>> {
        let call = self.handler.call(exchange);
        Box::pin(async move { tokio::spawn(call).await.map_err(|e| Box::new(e) as BoxError)? })
    }
}
