// ABOUTME: Shared logging setup for rvs binaries
// ABOUTME: Leveled plain-text output on stderr with a RUST_LOG override

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Standard logging to stderr. Default: INFO level, RUST_LOG override.
///
/// Lines look like `INFO SSH key pair generated ...`: no timestamp and no
/// target, since the tool is run interactively and finishes in seconds.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
