use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt().with_env_filter(filter).init();
}
