#![allow(dead_code)]

use bytes::Bytes;
use edict::Router;
use http::{HeaderMap, StatusCode};
use http_body_util::{BodyExt, Full};
use serde_json::Value;

/// A decoded response.
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn message(&self) -> &Value {
        &self.body["message"]
    }
}

pub fn request(method: &str, uri: &str) -> http::request::Builder {
    http::Request::builder().method(method).uri(uri)
}

pub fn empty(builder: http::request::Builder) -> http::Request<Full<Bytes>> {
    builder.body(Full::new(Bytes::new())).unwrap()
}

pub fn json(builder: http::request::Builder, body: &Value) -> http::Request<Full<Bytes>> {
    builder
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(serde_json::to_vec(body).unwrap())))
        .unwrap()
}

pub async fn send(app: &Router, req: http::Request<Full<Bytes>>) -> Reply {
    let res = app.handle(req).await;
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap();
    Reply { status, headers, body }
}

pub async fn call(app: &Router, method: &str, uri: &str) -> Reply {
    send(app, empty(request(method, uri))).await
}
