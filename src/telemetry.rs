use tracing_subscriber::EnvFilter;

/// Initializes structured logging, defaulting to `info` when `RUST_LOG` is unset.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
