//! Process-wide `tracing` setup.
//!
//! Logs go to stderr in every role: a worker's stdout carries the control
//! protocol. The filter comes from `RUST_LOG`, falling back to the given
//! default directive.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global subscriber.
///
/// Returns `false` if one was already installed (the existing one is kept).
pub fn init(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
        .is_ok()
}
