//! Shared `tracing` initialization, used by `catl-convert` and by any test
//! binary that wants human-readable log output. Library crates never
//! install a subscriber themselves, only emit events.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing-subscriber` formatter whose verbosity is driven by
/// `level` unless the `RUST_LOG` environment variable is already set, in
/// which case the environment wins.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
