//! Structured logging setup.
//!
//! Logs go to stderr so `egg get` output stays pipe-clean.  `RUST_LOG`
//! takes precedence over the level passed in.

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
