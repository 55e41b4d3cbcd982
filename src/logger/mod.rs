//! Logger module
//!
//! Installs the `tracing` subscriber and writes access log lines.
//! Access lines go to the `errhttp::access` target so they can be filtered
//! separately, e.g. `RUST_LOG=info,errhttp::access=off`.

mod format;

pub use format::{AccessLogEntry, AccessLogFormat};

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Initialize logging from configuration.
///
/// `RUST_LOG` takes precedence over `config.level`. Calling this more than
/// once keeps the first subscriber.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Emit one access log line.
pub fn log_access(entry: &AccessLogEntry, format: AccessLogFormat) {
    tracing::info!(target: "errhttp::access", "{}", entry.format(format));
}
