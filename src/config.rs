//! Site configuration module.
//!
//! Handles loading, validating, and merging `sitedelta.toml`. Stock defaults
//! are the base layer; the site's file overrides any subset of them.
//!
//! ## Config File Location
//!
//! Place `sitedelta.toml` in the site root, next to the content directory:
//!
//! ```text
//! my-site/
//! ├── sitedelta.toml           # Site config (overrides stock defaults)
//! ├── .sitedelta/
//! │   └── records.json         # Build records from the last pass
//! └── content/
//!     ├── about.md
//!     └── posts/
//!         └── hello.md
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! content_root = "content"      # Path to content directory, relative to the site root
//!
//! [store]
//! path = ".sitedelta/records.json"
//!
//! [crawl]
//! extensions = ["md", "markdown", "html"]
//! default_type = "page"         # Type for files outside any mapped directory
//!
//! [crawl.type_dirs]
//! posts = "post"                # First directory component -> document type
//!
//! [types]
//! custom = []                   # Extra document types to register at startup
//! unpublished = ["tag", "category"]  # Types with no published_* collection
//!
//! [pagination]
//! page_size = 10
//! base_file_name = "index.html"
//! naming = "directory"          # "directory" (2/index.html) or "suffix" (index-2.html)
//!
//! [logging]
//! level = "warn"                # tracing filter; RUST_LOG overrides
//!
//! [processing]
//! max_processes = 4             # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want. Tables merge
//! key by key, so mapping one more directory keeps the stock `posts` mapping:
//!
//! ```toml
//! [crawl.type_dirs]
//! projects = "project"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::paginate::PageNaming;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file name, looked up in the site root.
pub const CONFIG_FILE: &str = "sitedelta.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `sitedelta.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Path to the content root directory, relative to the site root.
    #[serde(default = "default_content_root")]
    pub content_root: String,
    /// Where build records persist between passes.
    pub store: StoreConfig,
    /// Source discovery settings.
    pub crawl: CrawlConfig,
    /// Document types beyond the built-ins.
    pub types: TypesConfig,
    /// Listing pagination.
    pub pagination: PaginationConfig,
    /// Diagnostic log filter.
    pub logging: LoggingConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

fn default_content_root() -> String {
    "content".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_root: default_content_root(),
            store: StoreConfig::default(),
            crawl: CrawlConfig::default(),
            types: TypesConfig::default(),
            pagination: PaginationConfig::default(),
            logging: LoggingConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pagination.page_size == 0 {
            return Err(ConfigError::Validation(
                "pagination.page_size must be at least 1".into(),
            ));
        }
        if self.pagination.base_file_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "pagination.base_file_name must not be empty".into(),
            ));
        }
        if self.crawl.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "crawl.extensions must not be empty".into(),
            ));
        }
        if self.store.path.trim().is_empty() {
            return Err(ConfigError::Validation("store.path must not be empty".into()));
        }
        let type_names = std::iter::once(&self.crawl.default_type)
            .chain(self.crawl.type_dirs.values())
            .chain(&self.types.custom)
            .chain(&self.types.unpublished);
        for name in type_names {
            if !valid_type_name(name) {
                return Err(ConfigError::Validation(format!(
                    "invalid document type name {name:?}: must be non-empty and contain no '/'"
                )));
            }
        }
        if tracing_subscriber::EnvFilter::try_new(&self.logging.level).is_err() {
            return Err(ConfigError::Validation(format!(
                "logging.level {:?} is not a valid filter",
                self.logging.level
            )));
        }
        Ok(())
    }

    /// Absolute location of the record file for a site rooted at `site_root`.
    pub fn store_path(&self, site_root: &Path) -> PathBuf {
        site_root.join(&self.store.path)
    }
}

fn valid_type_name(name: &str) -> bool {
    !name.trim().is_empty() && name == name.trim() && !name.contains('/')
}

/// Record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Record file, relative to the site root.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: ".sitedelta/records.json".into(),
        }
    }
}

/// Source discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrawlConfig {
    /// File extensions treated as source documents (case-insensitive).
    pub extensions: Vec<String>,
    /// Type for documents whose first directory has no mapping.
    pub default_type: String,
    /// First path component to document type, e.g. `posts = "post"`.
    pub type_dirs: BTreeMap<String, String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["md".into(), "markdown".into(), "html".into()],
            default_type: "page".into(),
            type_dirs: BTreeMap::from([("posts".to_string(), "post".to_string())]),
        }
    }
}

/// Document types beyond the built-ins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypesConfig {
    /// Registered at startup, in order, after the built-ins.
    pub custom: Vec<String>,
    /// Types without publication status: only `<type>s` is bound for them.
    pub unpublished: Vec<String>,
}

impl Default for TypesConfig {
    fn default() -> Self {
        Self {
            custom: Vec::new(),
            unpublished: vec!["tag".into(), "category".into()],
        }
    }
}

/// Listing pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    pub page_size: usize,
    /// File name of the first page; later pages derive from it.
    pub base_file_name: String,
    pub naming: PageNaming,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            base_file_name: "index.html".into(),
            naming: PageNaming::Directory,
        }
    }
}

/// Diagnostic logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `"info"` or `"warn,sitedelta::pass=debug"`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel fingerprinting workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Worker count for the rayon pool: every core unless `max_processes` asks
/// for fewer. Never zero, never more than the machine has.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
    match config.max_processes {
        Some(limit) => limit.clamp(1, cores),
        None => cores,
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================
//
//   stock defaults ──┐
//                    ├─ merge_toml ─▶ deserialize ─▶ validate ─▶ SiteConfig
//   sitedelta.toml ──┘   (optional)

/// Stock defaults as a TOML table: the layer every site file is merged onto.
pub fn stock_defaults_value() -> Result<toml::Table, ConfigError> {
    Ok(toml::Table::try_from(SiteConfig::default())?)
}

/// Fold `overlay` into `base`.
///
/// A key holding a table on both sides is merged recursively, so a site can
/// add one `[crawl.type_dirs]` entry and keep the stock ones. Any other
/// overlay value, arrays included, replaces what the base had.
pub fn merge_toml(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        let merged = match (base.remove(&key), value) {
            (Some(toml::Value::Table(mut nested)), toml::Value::Table(over)) => {
                merge_toml(&mut nested, over);
                toml::Value::Table(nested)
            }
            (_, value) => value,
        };
        base.insert(key, merged);
    }
}

/// Parse `sitedelta.toml` in `root` without applying defaults.
///
/// `Ok(None)` when the site has no config file.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Table>, ConfigError> {
    let text = match fs::read_to_string(root.join(CONFIG_FILE)) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(toml::from_str(&text)?))
}

/// Apply `overlay` (if any) to `base`, then deserialize and validate.
pub fn resolve_config(
    mut base: toml::Table,
    overlay: Option<toml::Table>,
) -> Result<SiteConfig, ConfigError> {
    if let Some(overlay) = overlay {
        merge_toml(&mut base, overlay);
    }
    let config: SiteConfig = toml::Value::Table(base).try_into()?;
    config.validate()?;
    Ok(config)
}

/// The site's effective config: stock defaults, overridden by
/// `sitedelta.toml` when present, validated.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value()?, load_raw_config(root)?)
}

/// Returns a fully-commented stock `sitedelta.toml` with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# sitedelta Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file in the site root as sitedelta.toml.
# Unknown keys will cause an error.

# Path to content directory, relative to the site root
content_root = "content"

# ---------------------------------------------------------------------------
# Build records
# ---------------------------------------------------------------------------
[store]
# Fingerprints and flags from the last build, relative to the site root.
# Deleting this file makes every document NEW on the next build.
path = ".sitedelta/records.json"

# ---------------------------------------------------------------------------
# Source discovery
# ---------------------------------------------------------------------------
[crawl]
# File extensions treated as source documents (case-insensitive).
extensions = ["md", "markdown", "html"]

# Document type for files outside any mapped directory.
default_type = "page"

# First directory component -> document type.
# Tables merge with the defaults, so adding a line keeps "posts".
[crawl.type_dirs]
posts = "post"

# ---------------------------------------------------------------------------
# Document types
# ---------------------------------------------------------------------------
[types]
# Extra types registered at startup, after page, post, index, archive, feed.
# Each gets "<type>s" and "published_<type>s" collections.
custom = []

# Types with no publication status. Only "<type>s" is bound for these.
unpublished = ["tag", "category"]

# ---------------------------------------------------------------------------
# Pagination
# ---------------------------------------------------------------------------
[pagination]
# Items per listing page.
page_size = 10

# File name of the first page.
base_file_name = "index.html"

# How later pages are named:
#   "directory" -> 2/index.html
#   "suffix"    -> index-2.html
naming = "directory"

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# tracing filter directive. RUST_LOG takes precedence when set.
level = "warn"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel fingerprinting workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
