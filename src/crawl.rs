//! Source discovery.
//!
//! A [`Crawler`] lists the documents that make up the site for one pass. The
//! build pass only needs the list; where it comes from is up to the adapter.
//! [`FsCrawler`] is the filesystem one:
//!
//! ```text
//! content/
//! ├── about.md              → "about.md",            type page
//! ├── posts/
//! │   ├── hello.md          → "posts/hello.md",      type post
//! │   └── _next.md          → "posts/_next.md",      type post, draft
//! ├── projects/
//! │   └── sitedelta.md      → "projects/sitedelta.md", type project
//! └── .obsidian/...         (hidden, skipped)
//! ```
//!
//! The declared type comes from the first directory component through
//! `[crawl.type_dirs]`, falling back to `default_type`. Files are not read
//! here; the pass reads each one when it fingerprints, so one unreadable file
//! fails only that document.

use crate::config::SiteConfig;
use crate::types::{Content, SourceDocument};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Content root not found: {0}")]
    MissingRoot(PathBuf),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Supplies the documents for one pass.
pub trait Crawler {
    fn discover(&self) -> Result<Vec<SourceDocument>, CrawlError>;
}

#[derive(Debug, Clone)]
pub struct FsCrawler {
    root: PathBuf,
    extensions: Vec<String>,
    default_type: String,
    type_dirs: BTreeMap<String, String>,
}

impl FsCrawler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: vec!["md".into()],
            default_type: "page".into(),
            type_dirs: BTreeMap::new(),
        }
    }

    /// Crawler for the site at `site_root`, shaped by its config.
    pub fn from_config(site_root: &Path, config: &SiteConfig) -> Self {
        Self {
            root: site_root.join(&config.content_root),
            extensions: config.crawl.extensions.clone(),
            default_type: config.crawl.default_type.clone(),
            type_dirs: config.crawl.type_dirs.clone(),
        }
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_type_dir(mut self, dir: &str, type_name: &str) -> Self {
        self.type_dirs.insert(dir.into(), type_name.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn wanted(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    fn document_for(&self, entry: &DirEntry) -> Option<SourceDocument> {
        let rel = entry.path().strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = rel
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        let (file_name, dirs) = parts.split_last()?;

        let declared_type = dirs
            .first()
            .and_then(|d| self.type_dirs.get(*d))
            .unwrap_or(&self.default_type)
            .clone();

        Some(SourceDocument {
            source_uri: parts.join("/"),
            declared_type,
            draft: file_name.starts_with('_'),
            content: Content::File(entry.path().to_path_buf()),
        })
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

impl Crawler for FsCrawler {
    fn discover(&self) -> Result<Vec<SourceDocument>, CrawlError> {
        if !self.root.is_dir() {
            return Err(CrawlError::MissingRoot(self.root.clone()));
        }
        let mut documents = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e));
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() || !self.wanted(entry.path()) {
                continue;
            }
            match self.document_for(&entry) {
                Some(doc) => documents.push(doc),
                None => tracing::warn!(path = %entry.path().display(), "skipping non-UTF-8 path"),
            }
        }
        tracing::debug!(count = documents.len(), root = %self.root.display(), "crawled sources");
        Ok(documents)
    }
}

/// Fixed document list, for callers that already know their sources.
impl Crawler for Vec<SourceDocument> {
    fn discover(&self) -> Result<Vec<SourceDocument>, CrawlError> {
        Ok(self.clone())
    }
}
