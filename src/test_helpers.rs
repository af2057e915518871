//! Shared test utilities for the sitedelta test suite.
//!
//! Stores with observable or failing behaviour, a render stage that records
//! what the pass asked of it, and document builders.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut detector = ChangeDetector::new(CountingStore::default());
//! let mut renderer = RecordingRenderer::default().failing_on("b.md");
//! let docs = vec![doc("a.md", "page", "A"), doc("b.md", "page", "B")];
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::detect::{CommitFlags, Status};
use crate::extract::ExtractorRegistry;
use crate::pass::{RenderError, RenderStage};
use crate::store::{MemoryStore, PersistedRecord, RecordStore, StoreError};
use crate::types::{Content, DocumentEntry, SourceDocument};

// =========================================================================
// Stores
// =========================================================================

/// Memory store that counts `put` and `delete` calls.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    writes: usize,
}

impl CountingStore {
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl RecordStore for CountingStore {
    fn get(&self, source_uri: &str) -> Result<Option<PersistedRecord>, StoreError> {
        self.inner.get(source_uri)
    }

    fn keys(&self) -> Result<BTreeSet<String>, StoreError> {
        self.inner.keys()
    }

    fn put(&mut self, source_uri: &str, record: PersistedRecord) -> Result<(), StoreError> {
        self.writes += 1;
        self.inner.put(source_uri, record)
    }

    fn delete(&mut self, source_uri: &str) -> Result<(), StoreError> {
        self.writes += 1;
        self.inner.delete(source_uri)
    }
}

/// Store whose every operation fails with `Unavailable`.
#[derive(Debug, Clone, Copy)]
pub struct UnavailableStore;

fn unavailable() -> StoreError {
    StoreError::Unavailable("store offline".into())
}

impl RecordStore for UnavailableStore {
    fn get(&self, _: &str) -> Result<Option<PersistedRecord>, StoreError> {
        Err(unavailable())
    }

    fn keys(&self) -> Result<BTreeSet<String>, StoreError> {
        Err(unavailable())
    }

    fn put(&mut self, _: &str, _: PersistedRecord) -> Result<(), StoreError> {
        Err(unavailable())
    }

    fn delete(&mut self, _: &str) -> Result<(), StoreError> {
        Err(unavailable())
    }
}

// =========================================================================
// Render stage
// =========================================================================

/// Render stage that records every call and fails for chosen URIs.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub rendered: Vec<(String, Status)>,
    pub removed: Vec<String>,
    /// Number of documents of each type visible through the type's
    /// collection extractor at render time.
    pub collection_sizes: BTreeMap<String, usize>,
    fail_render: BTreeSet<String>,
    fail_remove: BTreeSet<String>,
}

impl RecordingRenderer {
    pub fn failing_on(mut self, source_uri: &str) -> Self {
        self.fail_render.insert(source_uri.into());
        self
    }

    pub fn failing_remove_on(mut self, source_uri: &str) -> Self {
        self.fail_remove.insert(source_uri.into());
        self
    }

    pub fn rendered_uris(&self) -> Vec<&str> {
        self.rendered.iter().map(|(u, _)| u.as_str()).collect()
    }
}

impl RenderStage for RecordingRenderer {
    fn render(
        &mut self,
        document: &SourceDocument,
        status: Status,
        extractors: &ExtractorRegistry,
        site: &[DocumentEntry],
    ) -> Result<CommitFlags, RenderError> {
        if self.fail_render.contains(&document.source_uri) {
            return Err(RenderError::Failed(format!(
                "template error in {}",
                document.source_uri
            )));
        }
        let collection = extractors.collection_for(&document.declared_type, false, site)?;
        self.collection_sizes
            .insert(document.declared_type.clone(), collection.len());
        self.rendered.push((document.source_uri.clone(), status));
        Ok(CommitFlags::rendered())
    }

    fn remove(&mut self, source_uri: &str) -> Result<(), RenderError> {
        if self.fail_remove.contains(source_uri) {
            return Err(RenderError::Failed(format!("cannot delete output of {source_uri}")));
        }
        self.removed.push(source_uri.into());
        Ok(())
    }
}

// =========================================================================
// Document builders
// =========================================================================

/// In-memory document with the given body.
pub fn doc(source_uri: &str, type_name: &str, body: &str) -> SourceDocument {
    SourceDocument::from_bytes(source_uri, type_name, body.as_bytes().to_vec())
}

/// Document backed by a file that does not exist.
pub fn unreadable(source_uri: &str, type_name: &str) -> SourceDocument {
    SourceDocument {
        source_uri: source_uri.into(),
        declared_type: type_name.into(),
        draft: false,
        content: Content::File(PathBuf::from("/nonexistent/sitedelta-test").join(source_uri)),
    }
}

/// All URIs with the given status, in report order.
pub fn uris_with(statuses: &[(String, Status)], status: Status) -> Vec<&str> {
    statuses
        .iter()
        .filter(|(_, s)| *s == status)
        .map(|(u, _)| u.as_str())
        .collect()
}
