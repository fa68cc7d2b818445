//! # edict
//!
//! Declarative action controllers for HTTP services.
//!
//! You declare what a controller does: a path prefix and a list of actions,
//! each a method, a path, a handler, and optionally an input schema and
//! response headers. edict turns that into routes and does the rest:
//!
//! - **A fixed pipeline per action**: input merging (body, query, path
//!   parameters; path parameters win), JSON and cross-origin response
//!   headers, the action's own headers, the request language, schema
//!   validation, then the handler.
//! - **`OPTIONS` discovery**: every controller lists its actions (path,
//!   method, schema) without a line of code.
//! - **`405 Method Not Allowed`** with an `Allow` header for every method
//!   and path the controller does not declare.
//! - **One response shape**: `{ "status", "success", "message" }`, sent
//!   through named intents (`success`, `created`, `failed`, `not_found`, …).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use edict::{Action, Controller, Exchange, Router, Server};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = Router::new()
//!         .mount(
//!             Controller::new("/content")
//!                 .action(
//!                     Action::get("/:id", show)
//!                         .schema(json!({ "id": { "type": "number", "required": true } })),
//!                 )
//!                 .action(Action::post("/", create)),
//!         )?;
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await?;
//!     Ok(())
//! }
//!
//! async fn show(ex: Exchange) {
//!     // `id` has already been validated and coerced to a number.
//!     ex.respond().success(ex.get("id"));
//! }
//!
//! async fn create(ex: Exchange) {
//!     ex.respond().created(ex.data());
//! }
//! ```
//!
//! `GET /content/123` answers `{"status":200,"success":true,"message":123}`;
//! `DELETE /content/123` answers 405 with `Allow: OPTIONS, GET, POST`.

mod action;
mod config;
mod controller;
mod error;
mod exchange;
mod handler;
mod index;
mod locale;
mod method;
mod middleware;
mod request;
mod response;
mod router;
mod schema;
mod server;

pub use action::{Action, CompiledAction};
pub use config::{BodyLimit, InvalidBodyLimit, DEFAULT_BODY_LIMIT};
pub use controller::{Controller, MountedController, REQUEST_METHOD_HEADER};
pub use error::{BoxError, Error, MountError};
pub use exchange::Exchange;
pub use handler::{BoxFuture, Handler, IntoOutcome};
pub use locale::{Catalog, Locale, Translator, DEFAULT_LANGUAGE, LANGUAGE_HEADER};
pub use method::Method;
pub use request::Request;
pub use response::{Envelope, Intent, Responder, Response};
pub use router::Router;
pub use schema::{FieldSchema, FieldType, SchemaError, Validator, Verdict};
pub use server::Server;
