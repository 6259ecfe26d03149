//! Logging setup.
//!
//! Executed statements are logged at `debug`, COPY chunks at `trace` and
//! escaping truncation at `warn`. `RUST_LOG` overrides the level passed in.

use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber writing to stderr.
///
/// Calling it again after a subscriber is installed does nothing.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
