//! Tracing initialization for hosts that do not bring their own subscriber.

use tracing_subscriber::EnvFilter;

/// Install a global subscriber filtered by `TRIALSCAN_LOG` (default `info`).
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("TRIALSCAN_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
