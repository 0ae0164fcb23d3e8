//! Logging initialization.

/// Initialize the global tracing subscriber.
///
/// Call once at startup before any tracing events are emitted. Honors the
/// `RUST_LOG` env var; `level` is the fallback filter when it is unset.
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .init();
}
