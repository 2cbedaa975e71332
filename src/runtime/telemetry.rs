use std::io;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Routes `tracing` events to stderr, filtered by `RUST_LOG` (default `info`).
///
/// Stdout stays free for the validator PID or the failure line CI scripts read.
/// Only the first call installs a subscriber; later calls, or one made after
/// another subscriber is already global, do nothing.
pub fn init_tracing() {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .try_init();

    let _ = TRACING_INIT.set(());
}
