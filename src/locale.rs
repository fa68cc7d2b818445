//! Per-request locale context.
//!
//! A controller holds one shared, read-only [`Translator`]. Each request gets
//! its own [`Locale`], which pairs that translator with the language the
//! request asked for (via the `X-Language` header) or the default one.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Language used when a request does not ask for one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Request header carrying the caller's language hint.
pub const LANGUAGE_HEADER: &str = "x-language";

/// Source of translated strings.
///
/// Implementations are shared across concurrent requests and must not keep
/// per-request state; the active language is passed in on every lookup.
pub trait Translator: Send + Sync + 'static {
    /// Language activated when the request carries no hint.
    fn default_language(&self) -> &str {
        DEFAULT_LANGUAGE
    }

    /// Looks `key` up in `language`. `None` when there is no entry.
    fn translate(&self, language: &str, key: &str) -> Option<String>;
}

/// The locale of one request.
#[derive(Clone)]
pub struct Locale {
    translator: Arc<dyn Translator>,
    language: String,
}

impl Locale {
    pub(crate) fn new(translator: Arc<dyn Translator>) -> Self {
        let language = translator.default_language().to_owned();
        Self { translator, language }
    }

    /// Makes `tag` the active language. Blank tags activate the default.
    pub fn set_language(&mut self, tag: &str) {
        let tag = tag.trim();
        if tag.is_empty() {
            self.init_default();
        } else {
            self.language = tag.to_owned();
        }
    }

    /// Activates the translator's default language.
    pub fn init_default(&mut self) {
        self.language = self.translator.default_language().to_owned();
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Translates `key` into the active language.
    ///
    /// Lookup order: the exact tag (`pt-BR`), its primary subtag (`pt`), the
    /// default language. When all miss, the key itself is returned.
    pub fn translate(&self, key: &str) -> String {
        let primary = self.language.split('-').next().unwrap_or(&self.language);
        [self.language.as_str(), primary, self.translator.default_language()]
            .into_iter()
            .find_map(|lang| self.translator.translate(lang, key))
            .unwrap_or_else(|| key.to_owned())
    }
}

impl fmt::Debug for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locale").field("language", &self.language).finish()
    }
}

/// In-memory [`Translator`]: `language → key → text`.
///
/// ```rust
/// use edict::Catalog;
///
/// let catalog = Catalog::default()
///     .insert("en", "greeting", "hello")
///     .insert("fr", "greeting", "bonjour");
/// ```
#[derive(Debug)]
pub struct Catalog {
    default_language: String,
    entries: HashMap<String, HashMap<String, String>>,
}

impl Catalog {
    pub fn new(default_language: impl Into<String>) -> Self {
        Self { default_language: default_language.into(), entries: HashMap::new() }
    }

    pub fn insert(
        mut self,
        language: impl Into<String>,
        key: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.entries
            .entry(language.into())
            .or_default()
            .insert(key.into(), text.into());
        self
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

impl Translator for Catalog {
    fn default_language(&self) -> &str {
        &self.default_language
    }

    fn translate(&self, language: &str, key: &str) -> Option<String> {
        self.entries.get(language)?.get(key).cloned()
    }
}
