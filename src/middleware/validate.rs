//! Stage 5: schema filtering and validation.

use std::sync::Arc;

use tracing::error;

use super::{Middleware, Next};
use crate::error::BoxError;
use crate::exchange::Exchange;
use crate::handler::BoxFuture;
use crate::schema::{Validator, Verdict};

/// Runs the action's validator over `exchange.data`.
///
/// - filter, then validate; the filtered data replaces the original
/// - [`Verdict::Invalid`] answers 400 with the validator's payload
/// - an `Err` from either step is logged and answers 500 with its text only
///
/// Only installed on actions that declare a schema.
pub(crate) struct Validate {
    pub(crate) validator: Arc<dyn Validator>,
}

impl Middleware for Validate {
    fn name(&self) -> &'static str {
        "validate"
    }

    fn process<'a>(&'a self, mut exchange: Exchange, next: Next<'a>) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(async move {
            let data = std::mem::take(&mut exchange.data);
            exchange.data = match self.validator.filter(data).await {
                Ok(filtered) => filtered,
                Err(e) => {
                    internal_failure(&exchange, &e);
                    return Ok(());
                }
            };

            let verdict = self.validator.validate(&exchange.data).await;
            match verdict {
                Ok(Verdict::Valid) => next.run(exchange).await,
                Ok(Verdict::Invalid(payload)) => {
                    exchange.responder.failed(payload);
                    Ok(())
                }
                Err(e) => {
                    internal_failure(&exchange, &e);
                    Ok(())
                }
            }
        })
    }
}

fn internal_failure(exchange: &Exchange, e: &BoxError) {
    error!(
        method = %exchange.action.method,
        path = %exchange.action.path,
        error = %e,
        "validator failed unexpectedly"
    );
    exchange.responder.server_error(e.to_string());
}
