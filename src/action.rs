//! Declared actions and their compiled form.
//!
//! An [`Action`] is what the application writes: a method, a path relative to
//! the controller prefix, a handler, and optionally a schema and extra
//! response headers. Mounting compiles each one into a [`CompiledAction`],
//! the read-only record the router and the pipeline work from.

use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::error::MountError;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::schema::{FieldSchema, Validator};

/// One declared action.
///
/// ```rust
/// use edict::{Action, Exchange};
/// use serde_json::json;
///
/// async fn show(ex: Exchange) {
///     ex.respond().success(ex.get("id"));
/// }
///
/// let action = Action::get("/:id", show)
///     .schema(json!({ "id": { "type": "number", "required": true } }))
///     .header("cache-control", "no-store");
/// ```
pub struct Action {
    method: Method,
    path: String,
    handler: BoxedHandler,
    schema: Option<SchemaSource>,
    headers: Vec<(String, String)>,
}

enum SchemaSource {
    Spec(Value),
    Validator(Arc<dyn Validator>),
}

impl Action {
    pub fn new(method: Method, path: &str, handler: impl Handler) -> Self {
        Self {
            method,
            path: path.to_owned(),
            handler: handler.into_boxed_handler(),
            schema: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: &str, handler: impl Handler) -> Self { Self::new(Method::Get, path, handler) }
    pub fn post(path: &str, handler: impl Handler) -> Self { Self::new(Method::Post, path, handler) }
    pub fn put(path: &str, handler: impl Handler) -> Self { Self::new(Method::Put, path, handler) }
    pub fn patch(path: &str, handler: impl Handler) -> Self { Self::new(Method::Patch, path, handler) }
    pub fn delete(path: &str, handler: impl Handler) -> Self { Self::new(Method::Delete, path, handler) }

    /// Validates input against a [`FieldSchema`] spec, compiled at mount time.
    pub fn schema(mut self, spec: Value) -> Self {
        self.schema = Some(SchemaSource::Spec(spec));
        self
    }

    /// Validates input with a custom [`Validator`].
    pub fn validator(mut self, validator: impl Validator) -> Self {
        self.schema = Some(SchemaSource::Validator(Arc::new(validator)));
        self
    }

    /// Adds a response header sent with every reply of this action.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }

    /// Turns the declaration into its runtime record.
    ///
    /// Fails on a malformed schema spec or an unrepresentable header.
    pub(crate) fn compile(self) -> Result<CompiledAction, MountError> {
        let validator = match self.schema {
            None => None,
            Some(SchemaSource::Validator(v)) => Some(v),
            Some(SchemaSource::Spec(spec)) => {
                let schema = FieldSchema::compile(&spec).map_err(|source| MountError::Schema {
                    method: self.method,
                    path: self.path.clone(),
                    source,
                })?;
                Some(Arc::new(schema) as Arc<dyn Validator>)
            }
        };

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let invalid = || MountError::Header {
                method: self.method,
                path: self.path.clone(),
                name: name.clone(),
            };
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            headers.insert(name, value);
        }

        Ok(CompiledAction {
            method: self.method,
            pattern: normalize(&self.path),
            path: self.path,
            handler: self.handler,
            validator,
            headers,
        })
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// A mounted action: read-only and shared by every request routed to it.
pub struct CompiledAction {
    pub(crate) method: Method,
    /// As declared, e.g. `/users/:id`.
    pub(crate) path: String,
    /// Router form, e.g. `/users/{id}`.
    pub(crate) pattern: String,
    pub(crate) handler: BoxedHandler,
    pub(crate) validator: Option<Arc<dyn Validator>>,
    pub(crate) headers: HeaderMap,
}

impl CompiledAction {
    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    pub fn validator(&self) -> Option<&dyn Validator> {
        self.validator.as_deref()
    }

    /// Schema description for discovery, `null` without a validator.
    pub fn describe(&self) -> Value {
        self.validator.as_ref().map_or(Value::Null, |v| v.describe())
    }
}

impl fmt::Debug for CompiledAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledAction")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("validated", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}

/// Normalizes a declared path into router syntax.
///
/// Ensures a leading `/`, drops a trailing one (except on the root), and
/// rewrites express-style `:name` segments to `{name}`.
pub(crate) fn normalize(path: &str) -> String {
    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix(':') {
            Some(name) => format!("{{{name}}}"),
            None => s.to_owned(),
        })
        .collect();

    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::Exchange;
    use serde_json::json;

    async fn noop(_ex: Exchange) {}

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("users"), "/users");
        assert_eq!(normalize("/users/"), "/users");
        assert_eq!(normalize("/users/:id"), "/users/{id}");
        assert_eq!(normalize("/a/:b/c/:d"), "/a/{b}/c/{d}");
    }

    #[test]
    fn compiles_schema_and_headers() {
        let compiled = Action::get("/:id", noop)
            .schema(json!({ "id": { "type": "number" } }))
            .header("X-Powered-By", "edict")
            .compile()
            .unwrap();

        assert_eq!(compiled.method(), Method::Get);
        assert_eq!(compiled.path(), "/:id");
        assert_eq!(compiled.pattern, "/{id}");
        assert_eq!(compiled.headers()["x-powered-by"], "edict");
        assert_eq!(compiled.describe(), json!({ "id": { "type": "number" } }));
    }

    #[test]
    fn malformed_schema_fails_compilation() {
        let err = Action::post("/", noop)
            .schema(json!({ "id": { "type": "nope" } }))
            .compile()
            .unwrap_err();
        assert!(matches!(err, MountError::Schema { method: Method::Post, .. }));
    }

    #[test]
    fn invalid_header_fails_compilation() {
        let err = Action::get("/", noop).header("bad header", "x").compile().unwrap_err();
        assert!(matches!(err, MountError::Header { .. }));

        let err = Action::get("/", noop).header("x-ok", "line\nbreak").compile().unwrap_err();
        assert!(matches!(err, MountError::Header { .. }));
    }

    #[test]
    fn no_schema_means_no_validator() {
        let compiled = Action::delete("/", noop).compile().unwrap();
        assert!(compiled.validator().is_none());
        assert_eq!(compiled.describe(), Value::Null);
    }
}
