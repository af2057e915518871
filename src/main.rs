use clap::{Parser, Subcommand, ValueEnum};
use sitedelta::config::{self, SiteConfig};
use sitedelta::crawl::{Crawler, FsCrawler};
use sitedelta::detect::ChangeDetector;
use sitedelta::paginate::{PageNaming, PageSequence};
use sitedelta::pass::{self, RecordOnly};
use sitedelta::store::JsonStore;
use sitedelta::{logging, output};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sitedelta")]
#[command(about = "Incremental build core for static sites")]
#[command(long_about = "\
Incremental build core for static sites

Tracks which source documents changed since the last build, keeps document
types and their template collections in sync, and plans paginated listings.

Site structure:

  my-site/
  ├── sitedelta.toml               # Config (optional; see gen-config)
  ├── .sitedelta/records.json      # Build records, written by 'build'
  └── content/
      ├── about.md                 # type page (default_type)
      ├── posts/                   # type post (crawl.type_dirs)
      │   ├── hello.md
      │   └── _draft.md            # leading underscore = draft, unpublished
      └── .obsidian/               # hidden entries are skipped

Change status per document:
  new        no record from a previous build
  updated    content fingerprint differs from the record
  identical  content fingerprint matches the record
  removed    record exists, source is gone

Run 'sitedelta gen-config' to generate a documented sitedelta.toml.")]
#[command(version)]
struct Cli {
    /// Site root (holds sitedelta.toml and the content directory)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum NamingArg {
    Directory,
    Suffix,
}

impl From<NamingArg> for PageNaming {
    fn from(arg: NamingArg) -> Self {
        match arg {
            NamingArg::Directory => PageNaming::Directory,
            NamingArg::Suffix => PageNaming::Suffix,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Show what the next build would do, without writing anything
    Status,
    /// Classify every document, record changes, and forget removed sources
    Build,
    /// List document types and their template collections
    Types,
    /// Plan the pages of a listing
    Paginate {
        /// Number of items in the listing
        #[arg(long)]
        total: usize,
        /// Items per page (default: pagination.page_size)
        #[arg(long)]
        page_size: Option<usize>,
        /// Page file naming (default: pagination.naming)
        #[arg(long, value_enum)]
        naming: Option<NamingArg>,
    },
    /// Print a stock sitedelta.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Status => {
            let site_config = load_site(&cli.root)?;
            let documents = FsCrawler::from_config(&cli.root, &site_config).discover()?;
            init_thread_pool(&site_config.processing);
            let detector = open_detector(&cli.root, &site_config)?;
            let report = pass::survey(&documents, &detector)?;
            output::print_pass_report(&report);
            fail_on_errors(report.failures.len())?;
        }
        Command::Build => {
            let site_config = load_site(&cli.root)?;
            let documents = FsCrawler::from_config(&cli.root, &site_config).discover()?;
            init_thread_pool(&site_config.processing);
            let (mut types, extractors) = pass::init_registries(&site_config.types)?;
            let mut detector = open_detector(&cli.root, &site_config)?;
            let report = pass::run_pass(
                &documents,
                &mut detector,
                &mut types,
                &extractors,
                &mut RecordOnly,
            )?;
            output::print_pass_report(&report);
            fail_on_errors(report.failures.len())?;
        }
        Command::Types => {
            let site_config = load_site(&cli.root)?;
            let (types, extractors) = pass::init_registries(&site_config.types)?;
            let extractors = extractors
                .read()
                .map_err(|_| "extractor registry lock poisoned")?;
            output::print_types(&types, &extractors);
        }
        Command::Paginate {
            total,
            page_size,
            naming,
        } => {
            let site_config = load_site(&cli.root)?;
            let page_size = page_size.unwrap_or(site_config.pagination.page_size);
            let naming = naming.map(PageNaming::from).unwrap_or(site_config.pagination.naming);
            let sequence = PageSequence::new(total, page_size)?;
            let plan = sequence.pages(&site_config.pagination.base_file_name, naming);
            output::print_pagination(&plan, total, page_size, naming);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `sitedelta.toml` and start logging as it says.
fn load_site(root: &Path) -> Result<SiteConfig, config::ConfigError> {
    let site_config = config::load_config(root)?;
    logging::init_with_config(&site_config.logging);
    Ok(site_config)
}

fn open_detector(
    root: &Path,
    config: &SiteConfig,
) -> Result<ChangeDetector<JsonStore>, Box<dyn std::error::Error>> {
    let store = JsonStore::open(config.store_path(root))?;
    Ok(ChangeDetector::new(store))
}

fn fail_on_errors(failures: usize) -> Result<(), Box<dyn std::error::Error>> {
    if failures > 0 {
        return Err(format!("{failures} document(s) failed").into());
    }
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
