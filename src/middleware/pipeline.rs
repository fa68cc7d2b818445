//! Chain assembly and the terminal error stage.

use std::sync::Arc;

use tracing::error;

use super::{DeclaredHeaders, Decorate, Invoke, Middleware, Next, Normalize, ResolveLocale, Validate};
use crate::action::CompiledAction;
use crate::exchange::Exchange;
use crate::response::Response;

/// The stages bound to one action, in execution order.
pub(crate) struct Pipeline {
    stages: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    /// Assembles the fixed chain for `action`. Stages with nothing to do for
    /// this action (no declared headers, no schema) are left out.
    pub(crate) fn for_action(action: &CompiledAction) -> Self {
        let mut stages: Vec<Arc<dyn Middleware>> = vec![Arc::new(Normalize), Arc::new(Decorate)];
        if !action.headers.is_empty() {
            stages.push(Arc::new(DeclaredHeaders));
        }
        stages.push(Arc::new(ResolveLocale));
        if let Some(validator) = &action.validator {
            stages.push(Arc::new(Validate { validator: Arc::clone(validator) }));
        }
        stages.push(Arc::new(Invoke { handler: Arc::clone(&action.handler) }));
        Self { stages }
    }

    pub(crate) fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs `exchange` through the chain and returns whatever was sent.
    ///
    /// Any error escaping the chain is logged here and, if the request has
    /// not been answered yet, turned into a 500 with the error's text.
    pub(crate) async fn run(&self, exchange: Exchange) -> Response {
        let responder = exchange.responder.clone();
        let action = Arc::clone(&exchange.action);

        if let Err(e) = Next::new(&self.stages).run(exchange).await {
            error!(
                method = %action.method,
                path = %action.path,
                error = %e,
                "unhandled error in request pipeline"
            );
            if !responder.is_sent() {
                responder.server_error(e.to_string());
            }
        }

        responder.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use http::{HeaderMap, StatusCode};
    use serde_json::{json, Map, Value};

    use super::*;
    use crate::action::Action;
    use crate::locale::{Catalog, Locale};
    use crate::request::Request;
    use crate::response::Responder;

    fn request(body: Value, params: &[(&str, &str)]) -> Request {
        let Value::Object(body) = body else { panic!("body must be an object") };
        Request {
            method: http::Method::POST,
            path: "/".to_owned(),
            headers: HeaderMap::new(),
            query: Map::new(),
            body,
            params: params.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<HashMap<_, _>>(),
        }
    }

    async fn run(action: Action, request: Request) -> (StatusCode, Value) {
        let action = Arc::new(action.compile().unwrap());
        let pipeline = Pipeline::for_action(&action);
        let locale = Locale::new(Arc::new(Catalog::default()));
        let exchange = Exchange::new(request, action, locale, Responder::new());
        let response = pipeline.run(exchange).await;
        (response.status(), serde_json::from_slice(response.body()).unwrap())
    }

    async fn echo(ex: Exchange) {
        ex.respond().success(ex.data());
    }

    #[test]
    fn stages_run_in_fixed_order() {
        let plain = Action::get("/", echo).compile().unwrap();
        assert_eq!(
            Pipeline::for_action(&plain).stage_names(),
            vec!["normalize", "decorate", "locale", "invoke"]
        );

        let full = Action::get("/", echo)
            .schema(json!({ "id": { "type": "number" } }))
            .header("x-a", "1")
            .compile()
            .unwrap();
        assert_eq!(
            Pipeline::for_action(&full).stage_names(),
            vec!["normalize", "decorate", "declared_headers", "locale", "validate", "invoke"]
        );
    }

    #[tokio::test]
    async fn path_params_win_over_body() {
        let (status, body) = run(
            Action::post("/:id", echo),
            request(json!({ "id": "from-body", "name": "x" }), &[("id", "7")]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!({ "id": "7", "name": "x" }));
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_handler() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        async fn counted(ex: Exchange) {
            CALLS.fetch_add(1, Ordering::SeqCst);
            ex.respond().success("reached");
        }

        let (status, body) = run(
            Action::post("/", counted).schema(json!({ "id": { "type": "number", "required": true } })),
            request(json!({}), &[]),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!({ "id": ["id is required"] }));
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handler_error_becomes_server_error() {
        async fn broken(_ex: Exchange) -> Result<(), std::io::Error> {
            Err(std::io::Error::other("disk on fire"))
        }

        let (status, body) = run(Action::get("/", broken), request(json!({}), &[])).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "disk on fire");
    }

    #[tokio::test]
    async fn handler_error_after_send_keeps_first_response() {
        async fn late(ex: Exchange) -> Result<(), std::io::Error> {
            ex.respond().created("done");
            Err(std::io::Error::other("cleanup failed"))
        }

        let (status, body) = run(Action::post("/", late), request(json!({}), &[])).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "done");
    }

    #[tokio::test]
    async fn handler_panic_is_contained() {
        async fn explode(_ex: Exchange) {
            panic!("boom");
        }

        let (status, body) = run(Action::get("/", explode), request(json!({}), &[])).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn silent_handler_gets_server_error() {
        async fn silent(_ex: Exchange) {}

        let (status, _) = run(Action::get("/", silent), request(json!({}), &[])).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
