//! Handler trait and type erasure.
//!
//! # How async handlers are stored
//!
//! A controller holds handlers of *different* types in one action list, so
//! each is hidden behind a common trait object (`dyn ErasedHandler`):
//!
//! ```text
//! async fn show(ex: Exchange) { … }                ← user writes this
//!        ↓ Action::get("/:id", show)
//! show.into_boxed_handler()                        ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(show))                        ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(exchange)  at request time          ← one vtable dispatch
//!        ↓
//! Box::pin(async { show(ex).await.into_outcome() }) ← HandlerFuture
//! ```
//!
//! A handler replies through `ex.respond()`; its return value only reports
//! whether it failed. Returning `()` means "done", returning `Err(e)` hands
//! `e` to the pipeline, which logs it and answers 500 if nothing was sent.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::BoxError;
use crate::exchange::Exchange;

/// A heap-allocated, type-erased, `Send` future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a handler call resolves to once erased.
pub(crate) type HandlerFuture = BoxFuture<'static, Result<(), BoxError>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, exchange: Exchange) -> HandlerFuture;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Return types a handler may have.
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<(), BoxError>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E> IntoOutcome for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid action handler.
///
/// Automatically satisfied for any function with the signature:
///
/// ```text
/// async fn name(ex: Exchange)                     // or
/// async fn name(ex: Exchange) -> Result<(), E>    // E: Into<BoxError>
/// ```
///
/// The trait is sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Exchange) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Exchange) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Exchange) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
    fn call(&self, exchange: Exchange) -> HandlerFuture {
        let fut = (self.0)(exchange);
        Box::pin(async move { fut.await.into_outcome() })
    }
}
