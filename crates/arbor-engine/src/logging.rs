//! Tracing setup

use tracing_subscriber::{fmt, EnvFilter};

/// Install a fmt subscriber filtered by `ARBOR_LOG`, then `RUST_LOG`,
/// then `info`. Later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("ARBOR_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
