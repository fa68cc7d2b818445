//! The per-request context handed through the pipeline and to the handler.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::action::CompiledAction;
use crate::locale::Locale;
use crate::request::Request;
use crate::response::Responder;

/// Everything one request carries through its chain: the decoded request,
/// the matched action, the merged input data, the locale and the responder.
///
/// An `Exchange` is created when a request matches an action and dropped
/// when it completes. Nothing in it outlives the request.
#[derive(Debug)]
pub struct Exchange {
    pub(crate) request: Request,
    pub(crate) action: Arc<CompiledAction>,
    pub(crate) data: Map<String, Value>,
    pub(crate) locale: Locale,
    pub(crate) responder: Responder,
}

impl Exchange {
    pub(crate) fn new(
        request: Request,
        action: Arc<CompiledAction>,
        locale: Locale,
        responder: Responder,
    ) -> Self {
        Self { request, action, data: Map::new(), locale, responder }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The action this request was routed to.
    pub fn action(&self) -> &CompiledAction {
        &self.action
    }

    /// Merged input: body, then query, then path parameters, later sources
    /// overriding earlier ones on the same key. Already filtered by the
    /// action's validator when it has one.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.data
    }

    /// Shorthand for `data().get(key)`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn locale_mut(&mut self) -> &mut Locale {
        &mut self.locale
    }

    /// Translates `key` into the request's language.
    pub fn t(&self, key: &str) -> String {
        self.locale.translate(key)
    }

    /// The intent senders for this request.
    pub fn respond(&self) -> &Responder {
        &self.responder
    }
}
