//! Minimal edict example: two controllers, schema validation and discovery.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/content/42
//!   curl -X POST http://localhost:3000/content \
//!        -H 'content-type: application/json' \
//!        -d '{"id":"7"}'
//!   curl -X OPTIONS http://localhost:3000/content/42
//!   curl -X DELETE http://localhost:3000/content/42      # 405, Allow: OPTIONS, GET, POST
//!   curl -H 'x-language: fr' http://localhost:3000/hello

use edict::{Action, Catalog, Controller, Exchange, Router, Server};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let id = json!({ "id": { "type": "number", "required": true } });

    let app = Router::new()
        .mount(
            Controller::new("/content")
                .body_limit("1mb")
                .action(Action::get("/:id", show).schema(id.clone()))
                .action(Action::post("/", create).schema(id)),
        )?
        .mount(
            Controller::new("/hello")
                .translator(
                    Catalog::new("en")
                        .insert("en", "greeting", "Hello")
                        .insert("fr", "greeting", "Bonjour"),
                )
                .action(Action::get("/", hello).header("Cache-Control", "no-store")),
        )?;

    Server::bind("0.0.0.0:3000")?.serve(app).await?;
    Ok(())
}

// GET /content/:id
//
// `id` arrives as a path string and leaves the schema as a number.
async fn show(ex: Exchange) {
    ex.respond().success(json!({ "id": ex.get("id"), "title": "hello world" }));
}

// POST /content
async fn create(ex: Exchange) {
    ex.respond().created(ex.data());
}

// GET /hello
async fn hello(ex: Exchange) {
    ex.respond().success(ex.t("greeting"));
}
