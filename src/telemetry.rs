//! Tracing setup.
//!
//! Library code only emits `tracing` events; embedding applications decide
//! whether to install a subscriber. These helpers install the standard one.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "HEALTHCHECK_LOG";

/// Initialize a human-readable fmt subscriber.
///
/// Respects `HEALTHCHECK_LOG` for filtering and defaults to `info`. Returns
/// quietly if a global subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Initialize structured JSON output with a custom filter string
pub fn init_json_tracing(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .try_init();
}
