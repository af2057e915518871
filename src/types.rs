//! Document types shared between the crawler, the build pass, and the render
//! stage.

use crate::fingerprint::{Fingerprint, FingerprintReadError, fingerprint};
use serde::Serialize;
use std::borrow::Cow;
use std::path::PathBuf;

/// Where a document's bytes come from.
#[derive(Debug, Clone)]
pub enum Content {
    /// Already in memory (tests, generated sources).
    Bytes(Vec<u8>),
    /// Read on demand, so unreadable files fail per document.
    File(PathBuf),
}

/// A source document discovered by the crawler for one pass.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Stable path-derived key, `/`-separated, relative to the content root.
    pub source_uri: String,
    /// Declared or inferred document type name (`post`, `page`, ...).
    pub declared_type: String,
    /// Drafts are built but excluded from `published_*` collections.
    pub draft: bool,
    pub content: Content,
}

impl SourceDocument {
    pub fn from_bytes(
        source_uri: impl Into<String>,
        declared_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            source_uri: source_uri.into(),
            declared_type: declared_type.into(),
            draft: false,
            content: Content::Bytes(bytes.into()),
        }
    }

    pub fn read(&self) -> Result<Cow<'_, [u8]>, FingerprintReadError> {
        match &self.content {
            Content::Bytes(b) => Ok(Cow::Borrowed(b)),
            Content::File(path) => {
                std::fs::read(path)
                    .map(Cow::Owned)
                    .map_err(|source| FingerprintReadError {
                        source_uri: self.source_uri.clone(),
                        source,
                    })
            }
        }
    }

    pub fn fingerprint(&self) -> Result<Fingerprint, FingerprintReadError> {
        Ok(fingerprint(&self.read()?))
    }

    /// The render stage's view of this document.
    pub fn entry(&self) -> DocumentEntry {
        DocumentEntry {
            source_uri: self.source_uri.clone(),
            type_name: self.declared_type.clone(),
            published: !self.draft,
        }
    }
}

/// What extractors operate on: one row per document in the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentEntry {
    pub source_uri: String,
    pub type_name: String,
    pub published: bool,
}
