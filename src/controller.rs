//! Controllers: a path prefix, a body limit and a list of actions, mounted as
//! one unit.
//!
//! Mounting happens in two passes. First every action is compiled and
//! registered in the [`PathMethodIndex`]; nothing is routed yet. Then routes,
//! discovery patterns and the `Allow` header are all derived from the
//! finished, read-only index. A controller that fails to compile never
//! produces a partial route table.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use http::header::{ACCESS_CONTROL_ALLOW_METHODS, ALLOW};
use http::HeaderValue;
use matchit::Router as MatchitRouter;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::action::{Action, CompiledAction};
use crate::config::{BodyLimit, DEFAULT_BODY_LIMIT};
use crate::error::MountError;
use crate::exchange::Exchange;
use crate::index::PathMethodIndex;
use crate::locale::{Catalog, Locale, Translator};
use crate::method::Method;
use crate::middleware::{apply_cors, Pipeline};
use crate::request::Request;
use crate::response::{Responder, Response};

/// Request header naming the method a discovery caller is interested in.
pub const REQUEST_METHOD_HEADER: &str = "access-control-request-method";

/// A controller declaration.
///
/// ```rust
/// use edict::{Action, Controller, Exchange};
///
/// async fn list(ex: Exchange) {
///     ex.respond().success(Vec::<String>::new());
/// }
///
/// let controller = Controller::new("/users")
///     .body_limit("1mb")
///     .action(Action::get("/", list));
/// ```
pub struct Controller {
    prefix: String,
    body_limit: String,
    translator: Arc<dyn Translator>,
    actions: Vec<Action>,
}

impl Controller {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
            body_limit: DEFAULT_BODY_LIMIT.to_owned(),
            translator: Arc::new(Catalog::default()),
            actions: Vec::new(),
        }
    }

    /// Maximum request body, e.g. `"512kb"`. Defaults to `"10mb"`.
    pub fn body_limit(mut self, limit: &str) -> Self {
        self.body_limit = limit.to_owned();
        self
    }

    /// Translator backing every request's [`Locale`].
    pub fn translator(mut self, translator: impl Translator) -> Self {
        self.translator = Arc::new(translator);
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Compiles every action and builds the controller's routes.
    ///
    /// All configuration problems surface here, before any request is
    /// served: a bad prefix or body limit, a malformed schema, an invalid
    /// header, or two routes the router cannot tell apart.
    pub fn mount(self) -> Result<MountedController, MountError> {
        let prefix = normalize_prefix(&self.prefix)?;
        let body_limit: BodyLimit = self.body_limit.parse()?;

        let mut index = PathMethodIndex::default();
        for action in self.actions {
            index.register(Arc::new(action.compile()?));
        }

        let mut routes: HashMap<Method, MatchitRouter<Route>> = HashMap::new();
        for action in index.actions() {
            let route = Route {
                action: Arc::clone(action),
                pipeline: Pipeline::for_action(action),
            };
            debug!(
                method = %action.method,
                path = %action.path,
                stages = ?route.pipeline.stage_names(),
                "action compiled"
            );
            routes
                .entry(action.method)
                .or_default()
                .insert(action.pattern.clone(), route)
                .map_err(|source| MountError::Route {
                    method: action.method,
                    path: action.path.clone(),
                    source,
                })?;
        }

        let mut discovery = MatchitRouter::new();
        for pattern in index.patterns() {
            // One pattern per shape; the index resolves it to every action of
            // that shape, whatever its parameters are called.
            if let Err(e) = discovery.insert(pattern, pattern.to_owned()) {
                warn!(prefix = %prefix, pattern, error = %e, "path shadowed for discovery");
            }
        }

        let allow = HeaderValue::from_str(&index.allow_header())
            .unwrap_or_else(|_| HeaderValue::from_static("OPTIONS"));

        debug!(
            prefix = %prefix,
            actions = index.actions().len(),
            allow = ?allow,
            "controller mounted"
        );

        Ok(MountedController {
            prefix,
            body_limit,
            translator: self.translator,
            index,
            routes,
            discovery,
            allow,
        })
    }
}

/// An action's chain, bound to its method and path.
struct Route {
    action: Arc<CompiledAction>,
    pipeline: Pipeline,
}

/// A controller ready to serve requests. Read-only; shared by every request.
pub struct MountedController {
    prefix: String,
    body_limit: BodyLimit,
    translator: Arc<dyn Translator>,
    index: PathMethodIndex,
    routes: HashMap<Method, MatchitRouter<Route>>,
    discovery: MatchitRouter<String>,
    allow: HeaderValue,
}

impl MountedController {
    /// The normalized prefix (`""` for a controller mounted at the root).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn body_limit(&self) -> BodyLimit {
        self.body_limit
    }

    /// Methods advertised in `Allow`, `OPTIONS` first.
    pub fn allowed_methods(&self) -> Vec<&'static str> {
        self.index.allowed_methods()
    }

    /// The part of `path` below this controller's prefix, if it is under it.
    /// A trailing `/` is ignored.
    pub(crate) fn relative<'p>(&self, path: &'p str) -> Option<&'p str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }
        let rest = rest.trim_end_matches('/');
        Some(if rest.is_empty() { "/" } else { rest })
    }

    /// Routes a request already known to be under this controller.
    pub(crate) async fn dispatch(&self, mut request: Request) -> Response {
        let relative = self.relative(&request.path).unwrap_or("/").to_owned();

        if request.method == http::Method::OPTIONS {
            return self.discover(&request, &relative);
        }

        let Ok(method) = request.method.as_str().parse::<Method>() else {
            return self.method_not_allowed(&request);
        };

        let Some(route) = self.routes.get(&method).and_then(|tree| tree.at(&relative).ok()) else {
            return self.method_not_allowed(&request);
        };

        request.params = route
            .params
            .iter()
            .map(|(k, v)| (k.to_owned(), decode_param(v)))
            .collect();

        let route = route.value;
        let exchange = Exchange::new(
            request,
            Arc::clone(&route.action),
            Locale::new(Arc::clone(&self.translator)),
            Responder::new(),
        );
        route.pipeline.run(exchange).await
    }

    /// The synthesized `OPTIONS` handler.
    fn discover(&self, request: &Request, relative: &str) -> Response {
        let responder = self.synthesized(request);

        let actions = match self.discovery.at(relative) {
            Ok(matched) => self.index.lookup(matched.value),
            Err(_) => self.index.actions(),
        };
        let wanted = request.header(REQUEST_METHOD_HEADER).map(str::trim);

        let entries: Vec<Value> = actions
            .iter()
            .filter(|a| wanted.is_none_or(|m| m.eq_ignore_ascii_case(a.method.as_str())))
            .map(|a| {
                json!({
                    "path": self.public_path(a),
                    "method": a.method.as_str(),
                    "schema": a.describe(),
                })
            })
            .collect();

        responder.success(entries);
        responder.finish()
    }

    /// The synthesized 405 handler.
    fn method_not_allowed(&self, request: &Request) -> Response {
        let responder = self.synthesized(request);
        responder.method_not_allowed(format!("{} Is Not Allowed", request.method()));
        responder.finish()
    }

    /// Responder carrying the standard headers plus `Allow`.
    fn synthesized(&self, request: &Request) -> Responder {
        let responder = Responder::new();
        apply_cors(&responder, &request.headers);
        responder.set_header(ALLOW, self.allow.clone());
        responder.set_header(ACCESS_CONTROL_ALLOW_METHODS, self.allow.clone());
        responder
    }

    /// `<prefix><declared path>`, the root path contributing nothing.
    fn public_path(&self, action: &CompiledAction) -> String {
        let full = match action.path.trim_end_matches('/') {
            "" => self.prefix.clone(),
            p if p.starts_with('/') => format!("{}{p}", self.prefix),
            p => format!("{}/{p}", self.prefix),
        };
        if full.is_empty() { "/".to_owned() } else { full }
    }
}

/// Percent-decodes a matched path segment. Segments that do not decode to
/// UTF-8 are kept as sent.
fn decode_param(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_owned(), Cow::into_owned)
}

/// Prefixes are matched literally: `""` or `/segment[/segment…]`, no
/// trailing slash, no parameters.
fn normalize_prefix(prefix: &str) -> Result<String, MountError> {
    let invalid = || MountError::Prefix(prefix.to_owned());
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if !trimmed.starts_with('/') || trimmed.contains(['{', '}', ':', '*', '?', '#']) {
        return Err(invalid());
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn noop(_ex: Exchange) {}

    #[test]
    fn normalizes_prefixes() {
        assert_eq!(normalize_prefix("/").unwrap(), "");
        assert_eq!(normalize_prefix("").unwrap(), "");
        assert_eq!(normalize_prefix("/api/v1/").unwrap(), "/api/v1");
        assert!(normalize_prefix("api").is_err());
        assert!(normalize_prefix("/users/:id").is_err());
    }

    #[test]
    fn relative_paths_stay_under_prefix() {
        let mounted = Controller::new("/test").mount().unwrap();
        assert_eq!(mounted.relative("/test"), Some("/"));
        assert_eq!(mounted.relative("/test/"), Some("/"));
        assert_eq!(mounted.relative("/test/a/b/"), Some("/a/b"));
        assert_eq!(mounted.relative("/testing"), None);
        assert_eq!(mounted.relative("/other"), None);
    }

    #[test]
    fn mount_rejects_bad_configuration() {
        assert!(matches!(Controller::new("nope").mount(), Err(MountError::Prefix(_))));
        assert!(matches!(
            Controller::new("/a").body_limit("lots").mount(),
            Err(MountError::BodyLimit(_))
        ));
        assert!(matches!(
            Controller::new("/a")
                .action(Action::get("/", noop))
                .action(Action::get("/", noop))
                .mount(),
            Err(MountError::Route { method: Method::Get, .. })
        ));
    }

    #[test]
    fn advertises_declared_methods() {
        let mounted = Controller::new("/a")
            .action(Action::put("/", noop))
            .action(Action::get("/:id", noop))
            .action(Action::put("/:id", noop))
            .mount()
            .unwrap();
        assert_eq!(mounted.allowed_methods(), vec!["OPTIONS", "PUT", "GET"]);
        assert_eq!(mounted.body_limit(), BodyLimit::default());
    }

    #[test]
    fn differently_named_params_can_share_a_shape() {
        let mounted = Controller::new("/a")
            .action(Action::get("/:id", noop))
            .action(Action::delete("/:key", noop))
            .mount();
        assert!(mounted.is_ok());
    }

    #[test]
    fn path_parameters_are_percent_decoded() {
        assert_eq!(decode_param("hello%20world"), "hello world");
        assert_eq!(decode_param("caf%C3%A9"), "café");
        assert_eq!(decode_param("a+b"), "a+b");
        assert_eq!(decode_param("%FF"), "%FF");
    }
}
