//! # sitedelta
//!
//! The incremental core of a static site generator: decide which source
//! documents need rebuilding, keep the set of document types and their
//! template collections in sync, and lay out paginated listings.
//!
//! # Architecture: One Pass, Three Decisions
//!
//! Every build is a single pass over the documents the crawler found:
//!
//! ```text
//! 1. Types     declared types  →  registry  →  extractor bindings
//! 2. Changes   fingerprints    →  NEW / UPDATED / IDENTICAL / REMOVED
//! 3. Output    render stage    →  commit or evict build records
//! ```
//!
//! Only NEW and UPDATED documents reach the render stage. A record is
//! committed only after its document rendered, so an interrupted or failed
//! pass simply leaves work for the next one.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`fingerprint`] | SHA-256 content fingerprints |
//! | [`store`] | Build records: the `RecordStore` trait, memory and JSON-file backends |
//! | [`detect`] | Change detection: classify, find removed, commit, evict |
//! | [`doctype`] | Document-type registry with synchronous listener notification |
//! | [`extract`] | Template collections (`posts`, `published_posts`) bound per type |
//! | [`paginate`] | Page counts, neighbour links, and per-page file names |
//! | [`crawl`] | Source discovery; the filesystem crawler |
//! | [`pass`] | The build pass tying the above together |
//! | [`config`] | `sitedelta.toml` loading, validation, merging |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`output`] | CLI output formatting |
//! | [`types`] | Shared document types (`SourceDocument`, `DocumentEntry`) |
//!
//! # Design Decisions
//!
//! ## Content Fingerprints, Not Timestamps
//!
//! A document is UPDATED when its bytes hash differently from the last
//! committed build, whatever its mtime says. `git checkout` and fresh CI
//! clones reset timestamps; they do not change content.
//!
//! ## Notification on Every Registration
//!
//! Registering a known type still notifies every listener. Listeners are
//! written to be idempotent, and the built-ins get their extractor bindings
//! simply by being registered again once the binding listener is attached.
//!
//! ## Explicit Page Naming
//!
//! Pages after the first are named `2/index.html` or `index-2.html` depending
//! on [`paginate::PageNaming`]. Sites built under one convention break links
//! under the other, so the choice lives in config rather than in code.

pub mod config;
pub mod crawl;
pub mod detect;
pub mod doctype;
pub mod extract;
pub mod fingerprint;
pub mod logging;
pub mod output;
pub mod paginate;
pub mod pass;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
