//! Incoming HTTP request type.
//!
//! The body is collected (under the controller's size limit) and decoded
//! before routing, so every stage downstream sees plain JSON maps.

use std::collections::HashMap;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::HeaderMap;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use serde_json::{Map, Value};

use crate::error::BoxError;

/// An incoming HTTP request with its body already decoded.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: http::Method,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) query: Map<String, Value>,
    pub(crate) body: Map<String, Value>,
    pub(crate) params: HashMap<String, String>,
}

/// Why a request body could not be read.
#[derive(Debug, thiserror::Error)]
pub(crate) enum BodyError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("{0}")]
    Malformed(String),

    #[error("failed to read request body: {0}")]
    Read(BoxError),
}

impl Request {
    /// Collects and decodes `body`, refusing more than `limit` bytes.
    pub(crate) async fn read<B>(parts: Parts, body: B, limit: usize) -> Result<Self, BodyError>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<BoxError>,
    {
        let query = match parts.uri.query() {
            Some(raw) => decode_pairs(raw)
                .map_err(|e| BodyError::Malformed(format!("malformed query string: {e}")))?,
            None => Map::new(),
        };

        let bytes = Limited::new(body, limit)
            .collect()
            .await
            .map_err(|e| {
                if e.downcast_ref::<LengthLimitError>().is_some() {
                    BodyError::TooLarge { limit }
                } else {
                    BodyError::Read(e)
                }
            })?
            .to_bytes();

        let body = decode_body(&parts.headers, &bytes)?;

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            headers: parts.headers,
            query,
            body,
            params: HashMap::new(),
        })
    }

    pub fn method(&self) -> &str { self.method.as_str() }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn query(&self) -> &Map<String, Value> { &self.query }
    pub fn body(&self) -> &Map<String, Value> { &self.body }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For an action declared at `/users/:id`, `req.param("id")` on `/users/42`
    /// returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> { &self.params }
}

fn decode_body(headers: &HeaderMap, bytes: &Bytes) -> Result<Map<String, Value>, BodyError> {
    if bytes.is_empty() {
        return Ok(Map::new());
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .unwrap_or_default();

    if content_type == "application/json" || content_type.ends_with("+json") {
        return match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(BodyError::Malformed("request body must be a JSON object".to_owned())),
            Err(e) => Err(BodyError::Malformed(format!("malformed JSON body: {e}"))),
        };
    }

    if content_type == "application/x-www-form-urlencoded" {
        let raw = std::str::from_utf8(bytes)
            .map_err(|_| BodyError::Malformed("form body is not valid UTF-8".to_owned()))?;
        return decode_pairs(raw)
            .map_err(|e| BodyError::Malformed(format!("malformed form body: {e}")));
    }

    // Other media types are left to the handler via the raw request.
    Ok(Map::new())
}

/// Decodes `a=1&b=2` into a JSON map of strings. Repeated keys: last one wins.
fn decode_pairs(raw: &str) -> Result<Map<String, Value>, serde_urlencoded::de::Error> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw)?;
    Ok(pairs
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;

    fn parts(uri: &str, content_type: Option<&str>) -> Parts {
        let mut builder = http::Request::builder().method("POST").uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn decodes_query_and_json_body() {
        let req = Request::read(
            parts("/users?page=2&q=a%20b", Some("application/json; charset=utf-8")),
            Full::new(Bytes::from_static(br#"{"name":"alice","age":3}"#)),
            1024,
        )
        .await
        .unwrap();

        assert_eq!(req.path(), "/users");
        assert_eq!(req.query()["page"], "2");
        assert_eq!(req.query()["q"], "a b");
        assert_eq!(req.body()["name"], "alice");
        assert_eq!(req.body()["age"], 3);
    }

    #[tokio::test]
    async fn decodes_form_body() {
        let req = Request::read(
            parts("/", Some("application/x-www-form-urlencoded")),
            Full::new(Bytes::from_static(b"id=7&tag=x")),
            1024,
        )
        .await
        .unwrap();

        assert_eq!(req.body()["id"], "7");
        assert_eq!(req.body()["tag"], "x");
    }

    #[tokio::test]
    async fn empty_or_unknown_bodies_contribute_nothing() {
        let empty = Request::read(parts("/", Some("application/json")), Full::new(Bytes::new()), 16)
            .await
            .unwrap();
        assert!(empty.body().is_empty());

        let text = Request::read(parts("/", Some("text/plain")), Full::new(Bytes::from_static(b"hi")), 16)
            .await
            .unwrap();
        assert!(text.body().is_empty());
    }

    #[tokio::test]
    async fn rejects_oversized_body() {
        let err = Request::read(
            parts("/", Some("application/json")),
            Full::new(Bytes::from_static(br#"{"a":"0123456789"}"#)),
            8,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BodyError::TooLarge { limit: 8 }));
    }

    #[tokio::test]
    async fn rejects_non_object_json() {
        let err = Request::read(parts("/", Some("application/json")), Full::new(Bytes::from_static(b"[1]")), 64)
            .await
            .unwrap_err();
        assert!(matches!(err, BodyError::Malformed(_)));
    }
}
