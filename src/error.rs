//! Error types.
//!
//! Two families, never mixed:
//!
//! - [`Error`]: infrastructure failures from [`Server`](crate::Server):
//!   binding a port, accepting a connection.
//! - [`MountError`]: a controller that cannot be mounted. Raised once, at
//!   startup, by [`Controller::mount`](crate::Controller::mount).
//!
//! Per-request failures (bad input, unknown method, a handler that blew up)
//! are never `Err`s at this level. They become JSON envelopes.

use std::net::AddrParseError;

use crate::config::InvalidBodyLimit;
use crate::method::Method;
use crate::schema::SchemaError;

/// Boxed error used at the handler and validator seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by edict's server operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address: {0}")]
    Addr(#[from] AddrParseError),
}

/// A controller declaration that cannot be turned into routes.
#[derive(Debug, thiserror::Error)]
pub enum MountError {
    #[error("invalid path prefix `{0}`: must be empty or start with `/`")]
    Prefix(String),

    #[error(transparent)]
    BodyLimit(#[from] InvalidBodyLimit),

    #[error("malformed schema for {method} {path}: {source}")]
    Schema {
        method: Method,
        path: String,
        #[source]
        source: SchemaError,
    },

    #[error("invalid header `{name}` declared on {method} {path}")]
    Header {
        method: Method,
        path: String,
        name: String,
    },

    #[error("cannot route {method} {path}: {source}")]
    Route {
        method: Method,
        path: String,
        #[source]
        source: matchit::InsertError,
    },
}
