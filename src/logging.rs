//! Tracing subscriber setup.
//!
//! Logs always go to stderr so stdout stays free for protocol or CLI output.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Builds the filter: `RUST_LOG` wins, then `--verbose`, then the configured level.
pub fn filter(config: &LoggingConfig, verbose: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(&config.level)
    }
}

/// Installs the global subscriber. Returns false if one was already installed.
pub fn init(config: &LoggingConfig, verbose: bool) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter(config, verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
