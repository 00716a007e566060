use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured JSON tracing to stdout, filtered by `RUST_LOG`.
/// Call once at startup; subsequent calls are silently ignored so tests can
/// call it freely. Token secrets are never written to any log field.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json())
        .try_init();
}
