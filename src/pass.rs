//! One incremental build pass.
//!
//! Wires the crawler's document list through type registration, change
//! detection, and the render stage:
//!
//! ```text
//! documents ─┬─ register unseen types ──▶ listeners bind extractors
//!            ├─ fingerprint (parallel)
//!            ├─ classify    (parallel, read-only)
//!            ├─ find_removed
//!            ├─ NEW/UPDATED ──▶ RenderStage::render ──▶ commit
//!            ├─ REMOVED     ──▶ RenderStage::remove ──▶ evict
//!            └─ flush
//! ```
//!
//! Failures come in two sizes. A document that cannot be read or rendered is
//! recorded in [`PassReport::failures`] and left uncommitted, so it is retried
//! on the next pass; every other document still completes. A store failure
//! ends the pass with [`PassError::Store`]: without the store there is no
//! trustworthy classification for anything.
//!
//! Commits happen strictly after a successful render. An interrupted pass
//! leaves unrendered documents without a record, and they classify as NEW or
//! UPDATED again next time.

use crate::config::TypesConfig;
use crate::detect::{ChangeDetector, CommitFlags, Status, StatusCounts};
use crate::doctype::{BUILTIN_TYPES, DeclaredTypes, DocumentTypeRegistry, RegistryError};
use crate::extract::{ExtractError, ExtractorBindingListener, ExtractorRegistry, SharedExtractors};
use crate::fingerprint::{Fingerprint, FingerprintReadError};
use crate::store::{RecordStore, StoreError};
use crate::types::{DocumentEntry, SourceDocument};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("Render failed: {0}")]
    Failed(String),
}

/// Errors that abort a whole pass.
#[derive(Error, Debug)]
pub enum PassError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Extractor registry lock poisoned")]
    ExtractorsPoisoned,
}

/// Why one document did not complete.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error(transparent)]
    Read(#[from] FingerprintReadError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug)]
pub struct DocumentFailure {
    pub source_uri: String,
    pub error: DocumentError,
}

impl fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source_uri, self.error)
    }
}

/// The render stage as seen by the pass.
///
/// `render` is called for NEW and UPDATED documents only and returns the
/// flags to commit. `remove` is called for REMOVED documents before their
/// record is evicted.
pub trait RenderStage {
    fn render(
        &mut self,
        document: &SourceDocument,
        status: Status,
        extractors: &ExtractorRegistry,
        site: &[DocumentEntry],
    ) -> Result<CommitFlags, RenderError>;

    fn remove(&mut self, source_uri: &str) -> Result<(), RenderError>;
}

/// Render stage that produces no output and only records what was seen.
///
/// Commits `cached = true, rendered = false`: the build records know the
/// source, but nothing was written to the site directory. Resolves each
/// document's collection so an unbound type still fails loudly.
#[derive(Debug, Default)]
pub struct RecordOnly;

impl RenderStage for RecordOnly {
    fn render(
        &mut self,
        document: &SourceDocument,
        _status: Status,
        extractors: &ExtractorRegistry,
        site: &[DocumentEntry],
    ) -> Result<CommitFlags, RenderError> {
        extractors.collection_for(&document.declared_type, false, site)?;
        Ok(CommitFlags {
            cached: true,
            rendered: false,
        })
    }

    fn remove(&mut self, _source_uri: &str) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Outcome of a pass (or a read-only survey).
#[derive(Debug, Default)]
pub struct PassReport {
    /// Every readable or removed document with its status: discovered
    /// documents in input order, then removed ones sorted by URI.
    pub statuses: Vec<(String, Status)>,
    pub failures: Vec<DocumentFailure>,
    pub counts: StatusCounts,
    /// Types first seen during this pass, in registration order.
    pub registered_types: Vec<String>,
    /// Documents rendered and committed.
    pub rendered: usize,
    /// Removed documents whose records were evicted.
    pub evicted: usize,
}

impl PassReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn status_of(&self, source_uri: &str) -> Option<Status> {
        self.statuses
            .iter()
            .find(|(u, _)| u == source_uri)
            .map(|(_, s)| *s)
    }
}

/// Build the type registry and its extractor bindings for a site.
///
/// The binding listener is attached first, then the built-ins are
/// re-registered so they get extractors too, then the configured custom types
/// load as one engine provider.
pub fn init_registries(
    types: &TypesConfig,
) -> Result<(DocumentTypeRegistry, SharedExtractors), RegistryError> {
    let extractors = ExtractorRegistry::new().shared();
    let mut registry = DocumentTypeRegistry::new();
    registry.add_listener(ExtractorBindingListener::new(
        Arc::clone(&extractors),
        types.unpublished.iter().cloned(),
    ));
    for builtin in BUILTIN_TYPES {
        registry.register(builtin)?;
    }
    let declared = DeclaredTypes::new("config", types.custom.iter().cloned());
    registry.ensure_engines_loaded(&[&declared])?;
    Ok((registry, extractors))
}

type Fingerprinted<'a> = (Vec<(&'a SourceDocument, Fingerprint)>, Vec<DocumentFailure>);

fn fingerprint_all(documents: &[SourceDocument]) -> Fingerprinted<'_> {
    let results: Vec<_> = documents
        .par_iter()
        .map(|doc| (doc, doc.fingerprint()))
        .collect();

    let mut readable = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (doc, result) in results {
        match result {
            Ok(fp) => readable.push((doc, fp)),
            Err(e) => {
                tracing::warn!(uri = %doc.source_uri, error = %e, "skipping unreadable source");
                failures.push(DocumentFailure {
                    source_uri: doc.source_uri.clone(),
                    error: e.into(),
                });
            }
        }
    }
    (readable, failures)
}

/// Classify `documents` against `detector` without rendering or writing.
///
/// Unreadable documents are reported as failures and, like in a real pass,
/// still count as discovered.
pub fn survey<S: RecordStore>(
    documents: &[SourceDocument],
    detector: &ChangeDetector<S>,
) -> Result<PassReport, StoreError> {
    let (readable, failures) = fingerprint_all(documents);
    let batch: Vec<(String, Fingerprint)> = readable
        .iter()
        .map(|(doc, fp)| (doc.source_uri.clone(), *fp))
        .collect();
    let mut statuses = detector.classify_all(&batch)?;
    let removed = detector.find_removed(documents.iter().map(|d| d.source_uri.as_str()))?;
    statuses.extend(removed.into_iter().map(|uri| (uri, Status::Removed)));

    Ok(PassReport {
        counts: statuses.iter().map(|(_, s)| *s).collect(),
        statuses,
        failures,
        ..PassReport::default()
    })
}

/// Run one build pass.
///
/// Holds `detector` mutably for the whole pass, so two passes over the same
/// store cannot overlap.
pub fn run_pass<S, R>(
    documents: &[SourceDocument],
    detector: &mut ChangeDetector<S>,
    types: &mut DocumentTypeRegistry,
    extractors: &SharedExtractors,
    renderer: &mut R,
) -> Result<PassReport, PassError>
where
    S: RecordStore,
    R: RenderStage + ?Sized,
{
    let mut report = PassReport::default();

    // Listeners must have bound every type before the render stage asks for it.
    for doc in documents {
        if !types.contains(&doc.declared_type) {
            types.register(&doc.declared_type)?;
            report.registered_types.push(doc.declared_type.clone());
        }
    }

    let (readable, failures) = fingerprint_all(documents);
    report.failures = failures;

    let batch: Vec<(String, Fingerprint)> = readable
        .iter()
        .map(|(doc, fp)| (doc.source_uri.clone(), *fp))
        .collect();
    let statuses = detector.classify_all(&batch)?;
    let removed = detector.find_removed(documents.iter().map(|d| d.source_uri.as_str()))?;

    let site: Vec<DocumentEntry> = documents.iter().map(SourceDocument::entry).collect();
    {
        let registry = extractors
            .read()
            .map_err(|_| PassError::ExtractorsPoisoned)?;
        for ((doc, fp), (_, status)) in readable.iter().zip(&statuses) {
            if !status.needs_render() {
                continue;
            }
            match renderer.render(doc, *status, &registry, &site) {
                Ok(flags) => {
                    detector.commit(&doc.source_uri, *fp, flags)?;
                    report.rendered += 1;
                }
                Err(e) => {
                    tracing::warn!(uri = %doc.source_uri, error = %e, "render failed");
                    report.failures.push(DocumentFailure {
                        source_uri: doc.source_uri.clone(),
                        error: e.into(),
                    });
                }
            }
        }
    }

    report.statuses = statuses;
    for uri in removed {
        match renderer.remove(&uri) {
            Ok(()) => {
                detector.evict(&uri)?;
                report.evicted += 1;
            }
            Err(e) => {
                tracing::warn!(uri = %uri, error = %e, "removing output failed; record kept");
                report.failures.push(DocumentFailure {
                    source_uri: uri.clone(),
                    error: e.into(),
                });
            }
        }
        report.statuses.push((uri, Status::Removed));
    }

    detector.flush()?;

    report.counts = report.statuses.iter().map(|(_, s)| *s).collect();
    tracing::info!(
        counts = %report.counts,
        rendered = report.rendered,
        failures = report.failures.len(),
        "build pass complete"
    );
    Ok(report)
}

/// Failures grouped by URI, for display.
pub fn failures_by_uri(report: &PassReport) -> BTreeMap<&str, Vec<&DocumentError>> {
    let mut grouped: BTreeMap<&str, Vec<&DocumentError>> = BTreeMap::new();
    for f in &report.failures {
        grouped.entry(f.source_uri.as_str()).or_default().push(&f.error);
    }
    grouped
}
