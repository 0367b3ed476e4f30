//! Tracing subscriber setup for the binaries

use tracing_subscriber::EnvFilter;

use crate::config::{LogConfig, LogFormat};

/// Build the filter; `RUST_LOG` wins over `config.level`
fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global subscriber. Call once, at the start of `main`.
pub fn init_tracing(config: &LogConfig) {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(config));
    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
