//! Logging utilities for ipvs-proxy components.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize tracing with human-readable output.
///
/// `RUST_LOG` wins when set; otherwise `default_level` is used.
pub fn init(default_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter(default_level))
        .init();
}

/// Initialize tracing with JSON formatting (useful for structured logging).
pub fn init_json(default_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .with(filter(default_level))
        .init();
}

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
