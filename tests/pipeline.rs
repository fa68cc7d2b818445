mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use common::call;
use edict::{Action, BoxError, BoxFuture, Controller, Exchange, Router, Validator, Verdict};
use http::StatusCode;
use serde_json::{json, Map, Value};

/// Accepts only an even `n`; blows up when `n` is missing.
struct Even;

impl Validator for Even {
    fn filter(&self, data: Map<String, Value>) -> BoxFuture<'_, Result<Map<String, Value>, BoxError>> {
        Box::pin(async move { Ok::<_, BoxError>(data) })
    }

    fn validate<'a>(&'a self, data: &'a Map<String, Value>) -> BoxFuture<'a, Result<Verdict, BoxError>> {
        Box::pin(async move {
            let n = data
                .get("n")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or("n is unreadable")?;
            Ok::<_, BoxError>(if n % 2 == 0 {
                Verdict::Valid
            } else {
                Verdict::Invalid(json!({ "n": ["n must be even"] }))
            })
        })
    }

    fn describe(&self) -> Value {
        json!({ "n": "even" })
    }
}

static EVEN_CALLS: AtomicUsize = AtomicUsize::new(0);

async fn count_even(ex: Exchange) {
    EVEN_CALLS.fetch_add(1, Ordering::SeqCst);
    ex.respond().success(ex.get("n"));
}

#[tokio::test]
async fn custom_validator_drives_the_outcome() {
    let app = Router::new()
        .mount(Controller::new("/even").action(Action::get("/:n", count_even).validator(Even)))
        .unwrap();

    let before = EVEN_CALLS.load(Ordering::SeqCst);

    let ok = call(&app, "GET", "/even/4").await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.message(), "4");

    let rejected = call(&app, "GET", "/even/3").await;
    assert_eq!(
        rejected.body,
        json!({ "status": 400, "success": false, "message": { "n": ["n must be even"] } })
    );

    let broken = call(&app, "GET", "/even/x").await;
    assert_eq!(broken.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(broken.body["success"], false);

    assert_eq!(EVEN_CALLS.load(Ordering::SeqCst) - before, 1);

    let listed = call(&app, "OPTIONS", "/even/2").await;
    assert_eq!(listed.message()[0]["schema"], json!({ "n": "even" }));
}

#[tokio::test]
async fn failing_handler_becomes_server_error() {
    async fn boom(_ex: Exchange) -> Result<(), BoxError> {
        Err("database unavailable".into())
    }

    let app = Router::new()
        .mount(Controller::new("/boom").action(Action::get("/", boom)))
        .unwrap();

    let reply = call(&app, "GET", "/boom").await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.body["status"], 500);
}

#[tokio::test]
async fn path_parameters_reach_the_handler_decoded() {
    async fn echo(ex: Exchange) {
        ex.respond().success(ex.data());
    }

    let app = Router::new()
        .mount(Controller::new("/c").action(Action::get("/:name", echo)))
        .unwrap();

    let reply = call(&app, "GET", "/c/hello%20world").await;
    assert_eq!(reply.message(), &json!({ "name": "hello world" }));

    let reply = call(&app, "GET", "/c/%FF").await;
    assert_eq!(reply.message(), &json!({ "name": "%FF" }));
}
