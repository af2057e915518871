//! Extractor registry and the listener that keeps it in sync with document
//! types.
//!
//! Templates ask the render stage for collections by key: `posts`,
//! `published_posts`, `projects`, and so on. Each key maps to an
//! [`Extractor`] that selects documents from the site. Keys are derived from
//! type names by [`ExtractorBindingListener`] whenever a type is registered:
//!
//! | Type | Keys |
//! |------|------|
//! | `project` | `projects`, `published_projects` |
//! | `tag` (unpublished kind) | `tags` |
//!
//! Pluralisation is a plain `s` suffix, irregular plurals included
//! (`category` → `categorys`).
//!
//! The listener runs once per registration call, including repeats, so
//! binding is idempotent: registering an existing key replaces the extractor
//! with an equivalent one.

use crate::doctype::{ListenerError, TypeListener};
use crate::types::DocumentEntry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Selects documents from the full site listing.
pub type Extractor = Arc<dyn Fn(&[DocumentEntry]) -> Vec<DocumentEntry> + Send + Sync>;

/// Extractor registry shared between the binding listener and the render
/// stage.
pub type SharedExtractors = Arc<RwLock<ExtractorRegistry>>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractError {
    #[error("No extractors bound for document type '{0}'")]
    UnknownType(String),
    #[error("No extractor registered under key '{0}'")]
    UnknownKey(String),
}

/// Collection key for a type: the type name plus `s`.
pub fn collection_key(type_name: &str) -> String {
    format!("{type_name}s")
}

/// Key for the published subset of a type's collection.
pub fn published_key(type_name: &str) -> String {
    format!("published_{}", collection_key(type_name))
}

#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: BTreeMap<String, Extractor>,
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("keys", &self.extractors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedExtractors {
        Arc::new(RwLock::new(self))
    }

    /// Bind `key` to `extractor`, replacing any previous binding. Returns
    /// whether the key was new.
    pub fn register(&mut self, key: impl Into<String>, extractor: Extractor) -> bool {
        self.extractors.insert(key.into(), extractor).is_none()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.extractors.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        self.extractors.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Run the extractor bound to `key`.
    pub fn extract(
        &self,
        key: &str,
        documents: &[DocumentEntry],
    ) -> Result<Vec<DocumentEntry>, ExtractError> {
        let extractor = self
            .extractors
            .get(key)
            .ok_or_else(|| ExtractError::UnknownKey(key.to_string()))?;
        Ok(extractor(documents))
    }

    /// The collection for `type_name`, optionally limited to published
    /// documents.
    ///
    /// Fails with [`ExtractError::UnknownType`] when the type never went
    /// through registration. Asking for the published subset of a type that
    /// has no publication status fails with [`ExtractError::UnknownKey`].
    pub fn collection_for(
        &self,
        type_name: &str,
        published_only: bool,
        documents: &[DocumentEntry],
    ) -> Result<Vec<DocumentEntry>, ExtractError> {
        let key = collection_key(type_name);
        if !self.contains_key(&key) {
            return Err(ExtractError::UnknownType(type_name.to_string()));
        }
        if published_only {
            self.extract(&published_key(type_name), documents)
        } else {
            self.extract(&key, documents)
        }
    }
}

fn type_extractor(type_name: &str, published_only: bool) -> Extractor {
    let type_name = type_name.to_string();
    Arc::new(move |documents: &[DocumentEntry]| {
        let mut selected: Vec<DocumentEntry> = documents
            .iter()
            .filter(|d| d.type_name == type_name && (!published_only || d.published))
            .cloned()
            .collect();
        selected.sort_by(|a, b| a.source_uri.cmp(&b.source_uri));
        selected
    })
}

/// Binds `<type>s` and `published_<type>s` extractors for every registered
/// type.
pub struct ExtractorBindingListener {
    extractors: SharedExtractors,
    /// Types with no notion of publication status: only the plain
    /// collection key is bound.
    unpublished: BTreeSet<String>,
}

impl ExtractorBindingListener {
    pub fn new(
        extractors: SharedExtractors,
        unpublished: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            extractors,
            unpublished: unpublished.into_iter().map(Into::into).collect(),
        }
    }

    /// Keys this listener binds for `type_name`.
    pub fn keys_for(&self, type_name: &str) -> Vec<String> {
        if self.unpublished.contains(type_name) {
            vec![collection_key(type_name)]
        } else {
            vec![collection_key(type_name), published_key(type_name)]
        }
    }
}

impl TypeListener for ExtractorBindingListener {
    fn name(&self) -> &str {
        "extractor-bindings"
    }

    fn on_added(&mut self, type_name: &str) -> Result<(), ListenerError> {
        let mut registry = self
            .extractors
            .write()
            .map_err(|_| ListenerError("extractor registry lock poisoned".into()))?;
        registry.register(collection_key(type_name), type_extractor(type_name, false));
        if !self.unpublished.contains(type_name) {
            registry.register(published_key(type_name), type_extractor(type_name, true));
        }
        tracing::debug!(type_name, "bound extractors");
        Ok(())
    }
}
