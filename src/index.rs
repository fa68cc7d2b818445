//! Per-controller index of actions by path, and of declared methods.
//!
//! Built once while mounting, read-only afterwards. It answers the two
//! questions the synthesized endpoints ask: "what is declared at this path?"
//! (discovery) and "which methods does this controller speak?" (the `Allow`
//! header on discovery and 405 responses).

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::action::CompiledAction;
use crate::method::{Method, OPTIONS};

#[derive(Debug, Default)]
pub(crate) struct PathMethodIndex {
    /// Route shape → actions at it, in registration order. Patterns that
    /// differ only in parameter names (`/{id}`, `/{key}`) share one shape.
    paths: IndexMap<String, Vec<Arc<CompiledAction>>>,
    /// Every action, in registration order.
    actions: Vec<Arc<CompiledAction>>,
    methods: IndexSet<Method>,
}

impl PathMethodIndex {
    pub(crate) fn register(&mut self, action: Arc<CompiledAction>) {
        self.methods.insert(action.method);
        self.paths
            .entry(shape(&action.pattern))
            .or_default()
            .push(Arc::clone(&action));
        self.actions.push(action);
    }

    /// Actions declared at `pattern` or at any pattern of the same shape,
    /// first-registered first.
    pub(crate) fn lookup(&self, pattern: &str) -> &[Arc<CompiledAction>] {
        self.paths.get(&shape(pattern)).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn actions(&self) -> &[Arc<CompiledAction>] {
        &self.actions
    }

    /// One pattern per distinct shape (the first one registered), in
    /// registration order.
    pub(crate) fn patterns(&self) -> impl Iterator<Item = &str> {
        self.paths
            .values()
            .filter_map(|actions| actions.first())
            .map(|action| action.pattern.as_str())
    }

    /// `OPTIONS` first, then each declared method once, in declaration order.
    pub(crate) fn allowed_methods(&self) -> Vec<&'static str> {
        std::iter::once(OPTIONS)
            .chain(self.methods.iter().map(|m| m.as_str()))
            .collect()
    }

    /// [`allowed_methods`](Self::allowed_methods) as an `Allow` header value.
    pub(crate) fn allow_header(&self) -> String {
        self.allowed_methods().join(", ")
    }
}

/// `pattern` with parameter names erased: `/{id}/files/{*rest}` becomes
/// `/{}/files/{*}`.
fn shape(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut in_param = false;
    for c in pattern.chars() {
        match c {
            '{' => {
                in_param = true;
                out.push('{');
            }
            '}' => {
                in_param = false;
                out.push('}');
            }
            '*' if in_param => out.push('*'),
            _ if in_param => {}
            c => out.push(c),
        }
    }
    out
}
