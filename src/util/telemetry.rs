//! Telemetry helpers for structured logging and tracing.

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "ab_pool_resolver=info";

/// Install a default fmt subscriber unless the host already set one.
///
/// Honors `RUST_LOG`; otherwise logs this crate at `info`.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
