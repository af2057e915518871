//! Diagnostic logging.
//!
//! Library code logs through `tracing` macros; the binary installs a
//! subscriber once at startup. Diagnostics go to stderr so command output on
//! stdout stays clean for piping.
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! level = "warn"                        # quiet by default
//! # level = "info,sitedelta::detect=debug"  # per-module override
//! ```
//!
//! # Environment Variable
//!
//! `RUST_LOG` takes precedence over config:
//! ```bash
//! RUST_LOG=debug sitedelta build
//! RUST_LOG=sitedelta::pass=info sitedelta status
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::Uptime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Filter for `config`, unless `RUST_LOG` is set.
///
/// Falls back to `warn` when the configured directive does not parse, which
/// only happens for configs that skipped validation.
fn build_filter(config: &LoggingConfig) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Initialize logging with configuration.
///
/// Call once at startup. Safe to call multiple times (only first call takes
/// effect).
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_timer(Uptime::default())
            .with_level(true)
            .with_filter(build_filter(config));

        // A subscriber installed by the embedding program wins.
        let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
    });
}

/// Initialize logging with default configuration (`warn`).
pub fn init() {
    init_with_config(&LoggingConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init_with_config(&LoggingConfig {
            level: "debug".into(),
        });
        tracing::debug!("still fine after repeated init");
    }

    #[test]
    fn invalid_level_falls_back() {
        let filter = build_filter(&LoggingConfig {
            level: "sitedelta=loudest".into(),
        });
        // Either RUST_LOG or the warn fallback; never a panic
        let _ = filter.to_string();
    }
}
