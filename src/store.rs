//! Persisted build records.
//!
//! One [`PersistedRecord`] per previously processed source document, keyed by
//! source URI. The change detector only reads records during classification;
//! writes happen through `put`/`delete` when the render stage commits or
//! evicts a document.
//!
//! Mutating operations take `&mut self`, so a store cannot be written from two
//! places at once: commit and evict are serialised by the borrow checker and
//! a new build pass cannot begin while a previous one still holds the store.
//!
//! # Backends
//!
//! - [`MemoryStore`]: a `BTreeMap`, used by tests and by callers that keep
//!   their own persistence.
//! - [`JsonStore`]: a versioned JSON file (`.sitedelta/records.json` by
//!   default). Writes are buffered in memory and persisted by
//!   [`RecordStore::flush`] via write-to-temp-then-rename.

use crate::fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Version of the record file format. Bump to forget every prior build when
/// the format or the fingerprint algorithm changes.
const RECORDS_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record store unavailable: {0}")]
    Unavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Metadata kept from the last successful build of one source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub fingerprint: Fingerprint,
    /// Output is available in the render cache.
    pub cached: bool,
    /// Output has been written to the site directory.
    pub rendered: bool,
}

/// Narrow interface onto whatever holds prior-build metadata.
///
/// At most one record exists per source URI. Every operation may fail with
/// [`StoreError::Unavailable`]; callers must never read that as "no record".
pub trait RecordStore: Sync {
    fn get(&self, source_uri: &str) -> Result<Option<PersistedRecord>, StoreError>;

    fn keys(&self) -> Result<BTreeSet<String>, StoreError>;

    /// Insert or overwrite the record for `source_uri`.
    fn put(&mut self, source_uri: &str, record: PersistedRecord) -> Result<(), StoreError>;

    /// Remove the record for `source_uri`. Deleting a missing key is a no-op.
    fn delete(&mut self, source_uri: &str) -> Result<(), StoreError>;

    /// Persist buffered writes. Stores that write through need not override.
    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, PersistedRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, source_uri: &str) -> Result<Option<PersistedRecord>, StoreError> {
        Ok(self.records.get(source_uri).copied())
    }

    fn keys(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.records.keys().cloned().collect())
    }

    fn put(&mut self, source_uri: &str, record: PersistedRecord) -> Result<(), StoreError> {
        self.records.insert(source_uri.to_string(), record);
        Ok(())
    }

    fn delete(&mut self, source_uri: &str) -> Result<(), StoreError> {
        self.records.remove(source_uri);
        Ok(())
    }
}

// =============================================================================
// JSON file store
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct RecordsFile {
    version: u32,
    records: BTreeMap<String, PersistedRecord>,
}

/// File-backed record store.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    records: BTreeMap<String, PersistedRecord>,
    dirty: bool,
}

impl JsonStore {
    /// Open the record file at `path`.
    ///
    /// A missing, corrupt, or wrong-version file yields an empty store: the
    /// prior build is forgotten and every document classifies as new. Any
    /// other read failure (permissions, a directory in the way) means the
    /// store is unavailable.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let content = match std::fs::read(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::empty(path)),
            Err(e) => {
                return Err(StoreError::Unavailable(format!(
                    "cannot read {}: {e}",
                    path.display()
                )));
            }
        };
        let file: RecordsFile = match serde_json::from_slice(&content) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding unreadable record file");
                return Ok(Self::empty(path));
            }
        };
        if file.version != RECORDS_VERSION {
            tracing::warn!(
                path = %path.display(),
                found = file.version,
                expected = RECORDS_VERSION,
                "discarding record file with different version"
            );
            return Ok(Self::empty(path));
        }
        Ok(Self {
            path,
            records: file.records,
            dirty: false,
        })
    }

    fn empty(path: PathBuf) -> Self {
        Self {
            path,
            records: BTreeMap::new(),
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether there are writes not yet flushed to disk.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl RecordStore for JsonStore {
    fn get(&self, source_uri: &str) -> Result<Option<PersistedRecord>, StoreError> {
        Ok(self.records.get(source_uri).copied())
    }

    fn keys(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.records.keys().cloned().collect())
    }

    fn put(&mut self, source_uri: &str, record: PersistedRecord) -> Result<(), StoreError> {
        self.records.insert(source_uri.to_string(), record);
        self.dirty = true;
        Ok(())
    }

    fn delete(&mut self, source_uri: &str) -> Result<(), StoreError> {
        if self.records.remove(source_uri).is_some() {
            self.dirty = true;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = RecordsFile {
            version: RECORDS_VERSION,
            records: self.records.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        self.dirty = false;
        tracing::debug!(path = %self.path.display(), records = self.records.len(), "flushed record store");
        Ok(())
    }
}
