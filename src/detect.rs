//! Per-document change detection.
//!
//! Every build pass classifies each source document against the record left
//! by the previous build:
//!
//! | Record for URI | Fingerprint | Status |
//! |----------------|-------------|--------|
//! | none           | any         | [`Status::New`] |
//! | present        | equal       | [`Status::Identical`] |
//! | present        | different   | [`Status::Updated`] |
//!
//! The fourth status, [`Status::Removed`], comes from the other direction:
//! URIs the store knows about that the crawler did not rediscover. See
//! [`ChangeDetector::find_removed`].
//!
//! Classification is read-only. Only [`ChangeDetector::commit`] (after a
//! successful render) and [`ChangeDetector::evict`] (after removal handling)
//! touch the store, and `Identical` documents cause no writes at all.
//!
//! A failing store lookup is returned as an error, never read as "new".
//! Retrying is left to whoever runs the pass.

use crate::fingerprint::Fingerprint;
use crate::store::{PersistedRecord, RecordStore, StoreError};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Classification of one document for one build pass. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    New,
    Updated,
    Removed,
    Identical,
}

impl Status {
    /// Whether the document has to go through the render stage.
    pub fn needs_render(self) -> bool {
        matches!(self, Status::New | Status::Updated)
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::New => "new",
            Status::Updated => "updated",
            Status::Removed => "removed",
            Status::Identical => "identical",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Flags written alongside the fingerprint on commit, as instructed by the
/// render stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitFlags {
    pub cached: bool,
    pub rendered: bool,
}

impl CommitFlags {
    pub fn rendered() -> Self {
        Self {
            cached: true,
            rendered: true,
        }
    }
}

pub struct ChangeDetector<S> {
    store: S,
}

impl<S: RecordStore> ChangeDetector<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Classify one document by its source URI and current fingerprint.
    ///
    /// Fingerprints are only ever compared under the same key: equal content
    /// stored under another URI has no bearing on this one.
    pub fn classify(&self, source_uri: &str, current: &Fingerprint) -> Result<Status, StoreError> {
        let status = match self.store.get(source_uri)? {
            None => Status::New,
            Some(record) if record.fingerprint == *current => Status::Identical,
            Some(_) => Status::Updated,
        };
        tracing::debug!(uri = source_uri, fingerprint = %current.short(), %status, "classified");
        Ok(status)
    }

    /// Classify a batch of documents in parallel, preserving input order.
    ///
    /// Fails on the first store error; partial results are discarded so a
    /// flaky store can never produce a half-classified pass.
    pub fn classify_all(
        &self,
        documents: &[(String, Fingerprint)],
    ) -> Result<Vec<(String, Status)>, StoreError> {
        documents
            .par_iter()
            .map(|(uri, fp)| Ok((uri.clone(), self.classify(uri, fp)?)))
            .collect()
    }

    /// Source URIs recorded by a previous build but absent from `discovered`.
    pub fn find_removed<'a, I>(&self, discovered: I) -> Result<BTreeSet<String>, StoreError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut removed = self.store.keys()?;
        for uri in discovered {
            removed.remove(uri);
        }
        Ok(removed)
    }

    /// Record a successfully rendered document, overwriting any prior record.
    pub fn commit(
        &mut self,
        source_uri: &str,
        fingerprint: Fingerprint,
        flags: CommitFlags,
    ) -> Result<(), StoreError> {
        self.store.put(
            source_uri,
            PersistedRecord {
                fingerprint,
                cached: flags.cached,
                rendered: flags.rendered,
            },
        )
    }

    /// Forget a removed document.
    pub fn evict(&mut self, source_uri: &str) -> Result<(), StoreError> {
        self.store.delete(source_uri)
    }

    /// Persist buffered commits and evictions.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.store.flush()
    }
}

/// Per-status tally for a pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatusCounts {
    pub new: usize,
    pub updated: usize,
    pub removed: usize,
    pub identical: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: Status) {
        match status {
            Status::New => self.new += 1,
            Status::Updated => self.updated += 1,
            Status::Removed => self.removed += 1,
            Status::Identical => self.identical += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.new + self.updated + self.removed + self.identical
    }

    /// Documents that need work this pass.
    pub fn changed(&self) -> usize {
        self.new + self.updated + self.removed
    }
}

impl FromIterator<Status> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = Status>>(iter: I) -> Self {
        let mut counts = Self::default();
        for status in iter {
            counts.record(status);
        }
        counts
    }
}

impl fmt::Display for StatusCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} new, {} updated, {} removed, {} identical",
            self.new, self.updated, self.removed, self.identical
        )
    }
}
