//! The application router.
//!
//! Holds every mounted controller and sends each request to the one owning
//! its path. Inside a controller, routing is one radix tree per method via
//! [`matchit`]. Build it once at startup; pass it to [`Server::serve`].
//!
//! [`Server::serve`]: crate::Server::serve

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use tracing::debug;

use crate::controller::{Controller, MountedController};
use crate::error::{BoxError, MountError};
use crate::middleware::apply_cors;
use crate::request::{BodyError, Request};
use crate::response::{Responder, Response};

/// The application: a set of controllers, each under its own prefix.
#[derive(Default)]
pub struct Router {
    controllers: Vec<Arc<MountedController>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts `controller`. Returns `self` for chaining with `?`.
    ///
    /// ```rust
    /// use edict::{Action, Controller, Exchange, Router};
    ///
    /// async fn yap(ex: Exchange) {
    ///     ex.respond().success("yap");
    /// }
    ///
    /// # fn main() -> Result<(), edict::MountError> {
    /// let app = Router::new()
    ///     .mount(Controller::new("/test").action(Action::get("/", yap)))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn mount(self, controller: Controller) -> Result<Self, MountError> {
        Ok(self.mounted(controller.mount()?))
    }

    /// Adds a controller that was mounted separately.
    pub fn mounted(mut self, controller: MountedController) -> Self {
        self.controllers.push(Arc::new(controller));
        self
    }

    /// The controller with the longest prefix covering `path`.
    fn find(&self, path: &str) -> Option<&MountedController> {
        self.controllers
            .iter()
            .filter(|c| c.relative(path).is_some())
            .max_by_key(|c| c.prefix().len())
            .map(Arc::as_ref)
    }

    /// Handles one request end to end: picks the controller, reads the body
    /// under its limit, and runs routing and the pipeline.
    ///
    /// Never fails: every outcome is an envelope.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<Full<Bytes>>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();
        let method = parts.method.clone();
        let path = parts.uri.path().to_owned();

        let response = match self.find(&path) {
            None => {
                let responder = Responder::new();
                apply_cors(&responder, &parts.headers);
                responder.not_found("Not Found");
                responder.finish()
            }
            Some(controller) => {
                let headers = parts.headers.clone();
                match Request::read(parts, body, controller.body_limit().bytes()).await {
                    Ok(request) => controller.dispatch(request).await,
                    Err(e) => body_rejected(&headers, e),
                }
            }
        };

        debug!(method = %method, path = %path, status = response.status().as_u16(), "request handled");
        response.into_inner()
    }
}

fn body_rejected(headers: &http::HeaderMap, e: BodyError) -> Response {
    let responder = Responder::new();
    apply_cors(&responder, headers);
    match e {
        BodyError::TooLarge { .. } => {
            responder.send(http::StatusCode::PAYLOAD_TOO_LARGE, false, "Payload Too Large")
        }
        BodyError::Malformed(reason) => responder.failed(reason),
        BodyError::Read(e) => responder.failed(format!("failed to read request body: {e}")),
    }
    responder.finish()
}
