mod common;

use common::{call, empty, request, send};
use edict::{Action, Controller, Exchange, Router};
use http::StatusCode;
use serde_json::{json, Value};

fn id_schema() -> Value {
    json!({ "id": { "type": "Number", "defaultValue": null, "required": true } })
}

async fn noop(ex: Exchange) {
    ex.respond().success(Value::Null);
}

fn content() -> Router {
    Router::new()
        .mount(
            Controller::new("/content")
                .action(Action::get("/:id", noop).schema(id_schema()))
                .action(Action::post("/", noop).schema(id_schema()))
                .action(Action::delete("/:id", noop)),
        )
        .unwrap()
}

#[tokio::test]
async fn options_lists_actions_on_the_path() {
    let reply = call(&content(), "OPTIONS", "/content/7").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.message(),
        &json!([
            { "path": "/content/:id", "method": "GET", "schema": id_schema() },
            { "path": "/content/:id", "method": "DELETE", "schema": null },
        ])
    );
    assert_eq!(reply.header("allow"), Some("OPTIONS, GET, POST, DELETE"));
}

#[tokio::test]
async fn options_on_the_prefix_lists_root_actions() {
    let reply = call(&content(), "OPTIONS", "/content").await;
    assert_eq!(
        reply.message(),
        &json!([{ "path": "/content", "method": "POST", "schema": id_schema() }])
    );
}

#[tokio::test]
async fn options_on_an_unknown_path_lists_everything() {
    let reply = call(&content(), "OPTIONS", "/content/a/b/c").await;
    let methods: Vec<&str> = reply
        .message()
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["method"].as_str().unwrap())
        .collect();
    assert_eq!(methods, ["GET", "POST", "DELETE"]);
}

#[tokio::test]
async fn requested_method_narrows_discovery() {
    let app = content();

    let reply = send(
        &app,
        empty(request("OPTIONS", "/content").header("access-control-request-method", "POST")),
    )
    .await;
    assert_eq!(reply.message().as_array().unwrap().len(), 1);
    assert_eq!(reply.message()[0]["method"], "POST");

    let reply = send(
        &app,
        empty(request("OPTIONS", "/content").header("access-control-request-method", "DELETE")),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.message(), &json!([]));
}

#[tokio::test]
async fn discovery_is_a_preflight_answer() {
    let reply = send(
        &content(),
        empty(request("OPTIONS", "/content/1").header("origin", "https://app.example")),
    )
    .await;
    assert_eq!(reply.header("access-control-allow-origin"), Some("https://app.example"));
    assert_eq!(reply.header("access-control-allow-methods"), Some("OPTIONS, GET, POST, DELETE"));
}

#[tokio::test]
async fn controller_without_actions_still_answers() {
    let app = Router::new().mount(Controller::new("/empty")).unwrap();

    let reply = call(&app, "OPTIONS", "/empty").await;
    assert_eq!(reply.message(), &json!([]));

    let reply = call(&app, "GET", "/empty").await;
    assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(reply.header("allow"), Some("OPTIONS"));
}

#[tokio::test]
async fn actions_at_the_same_path_share_discovery_whatever_their_parameter_names() {
    let app = Router::new()
        .mount(
            Controller::new("/a")
                .action(Action::get("/:id", noop))
                .action(Action::delete("/:key", noop)),
        )
        .unwrap();

    let reply = call(&app, "OPTIONS", "/a/5").await;
    assert_eq!(
        reply.message(),
        &json!([
            { "path": "/a/:id", "method": "GET", "schema": null },
            { "path": "/a/:key", "method": "DELETE", "schema": null },
        ])
    );

    let reply = call(&app, "DELETE", "/a/5").await;
    assert_eq!(reply.status, StatusCode::OK);
}
