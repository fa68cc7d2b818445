//! The response envelope and the intent senders handlers reply through.
//!
//! Every response edict writes has the same JSON shape:
//!
//! ```json
//! { "status": 404, "success": false, "message": "..." }
//! ```
//!
//! Handlers never build responses directly. They pick an intent on the
//! [`Responder`] attached to their exchange (`success`, `failed`,
//! `not_found`, …) and hand it a message; status code, `success` flag and
//! framing are fixed by the intent.

use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

// ── Intent ────────────────────────────────────────────────────────────────────

/// The fixed set of named responses.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Intent {
    Success,          // 200
    Created,          // 201
    Accepted,         // 202
    Failed,           // 400
    Unauthorized,     // 401
    Forbidden,        // 403
    NotFound,         // 404
    MethodNotAllowed, // 405
    TooManyRequests,  // 429
    ServerError,      // 500
}

impl Intent {
    pub fn status(self) -> StatusCode {
        match self {
            Self::Success          => StatusCode::OK,
            Self::Created          => StatusCode::CREATED,
            Self::Accepted         => StatusCode::ACCEPTED,
            Self::Failed           => StatusCode::BAD_REQUEST,
            Self::Unauthorized     => StatusCode::UNAUTHORIZED,
            Self::Forbidden        => StatusCode::FORBIDDEN,
            Self::NotFound         => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::TooManyRequests  => StatusCode::TOO_MANY_REQUESTS,
            Self::ServerError      => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The envelope's `success` flag: true for the 2xx intents.
    pub fn is_success(self) -> bool {
        self.status().is_success()
    }
}

// ── Envelope ──────────────────────────────────────────────────────────────────

/// The JSON body of every response.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub status: u16,
    pub success: bool,
    pub message: Value,
}

// ── Response ──────────────────────────────────────────────────────────────────

/// A finished outgoing response.
#[derive(Debug)]
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

impl Response {
    fn envelope(status: StatusCode, success: bool, message: Value, mut headers: HeaderMap) -> Self {
        let envelope = Envelope { status: status.as_u16(), success, message };
        let body = match serde_json::to_vec(&envelope) {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => {
                error!(error = %e, "failed to encode response envelope");
                Bytes::from_static(br#"{"status":500,"success":false,"message":"Internal Server Error"}"#)
            }
        };
        headers
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static("application/json"));
        Self { status, headers, body }
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── Responder ─────────────────────────────────────────────────────────────────

/// The response-sending capability of one request.
///
/// Cloning is cheap and every clone writes to the same slot. The first send
/// wins; later sends are logged and dropped, so a handler that replies twice
/// cannot take the process down.
#[derive(Clone, Debug, Default)]
pub struct Responder {
    slot: Arc<Mutex<Slot>>,
}

#[derive(Debug, Default)]
struct Slot {
    headers: HeaderMap,
    sent: Option<Response>,
}

impl Responder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sets a response header, replacing any value already set under `name`.
    pub fn set_header(&self, name: HeaderName, value: HeaderValue) {
        self.slot.lock().headers.insert(name, value);
    }

    /// Current value of a response header.
    pub fn header(&self, name: &str) -> Option<HeaderValue> {
        self.slot.lock().headers.get(name).cloned()
    }

    /// Whether a response has already been sent on this exchange.
    pub fn is_sent(&self) -> bool {
        self.slot.lock().sent.is_some()
    }

    /// Sends an envelope with an explicit status and `success` flag.
    pub fn send(&self, status: StatusCode, success: bool, message: impl Serialize) {
        let (status, success, message) = match serde_json::to_value(message) {
            Ok(message) => (status, success, message),
            Err(e) => {
                error!(error = %e, "response message is not serializable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    false,
                    Value::String(format!("failed to serialize response: {e}")),
                )
            }
        };

        let mut slot = self.slot.lock();
        if slot.sent.is_some() {
            warn!(status = status.as_u16(), "response already sent, ignoring");
            return;
        }
        let headers = slot.headers.clone();
        slot.sent = Some(Response::envelope(status, success, message, headers));
    }

    pub fn intent(&self, intent: Intent, message: impl Serialize) {
        self.send(intent.status(), intent.is_success(), message);
    }

    pub fn success(&self, message: impl Serialize) { self.intent(Intent::Success, message) }
    pub fn created(&self, message: impl Serialize) { self.intent(Intent::Created, message) }
    pub fn accepted(&self, message: impl Serialize) { self.intent(Intent::Accepted, message) }
    pub fn failed(&self, message: impl Serialize) { self.intent(Intent::Failed, message) }
    pub fn unauthorized(&self, message: impl Serialize) { self.intent(Intent::Unauthorized, message) }
    pub fn forbidden(&self, message: impl Serialize) { self.intent(Intent::Forbidden, message) }
    pub fn not_found(&self, message: impl Serialize) { self.intent(Intent::NotFound, message) }
    pub fn method_not_allowed(&self, message: impl Serialize) { self.intent(Intent::MethodNotAllowed, message) }
    pub fn too_many_requests(&self, message: impl Serialize) { self.intent(Intent::TooManyRequests, message) }
    pub fn server_error(&self, message: impl Serialize) { self.intent(Intent::ServerError, message) }

    /// Takes the sent response. If nothing was sent, a 500 envelope is
    /// produced instead so the client is never left hanging.
    pub(crate) fn finish(&self) -> Response {
        let mut slot = self.slot.lock();
        match slot.sent.take() {
            Some(response) => response,
            None => {
                warn!("request finished without a response, answering 500");
                Response::envelope(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    false,
                    Value::String("No Response Sent".to_owned()),
                    slot.headers.clone(),
                )
            }
        }
    }
}
