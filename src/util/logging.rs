// src/util/logging.rs
//
// Logging configuration utilities

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Build the filter: RUST_LOG wins, otherwise the configured level.
pub fn filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// Set up logging on stderr, leaving stdout for sample lines.
pub fn setup(log_level: &str, format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(log_level))
        .with_writer(std::io::stderr)
        .with_target(false);

    // A second initialisation (tests, embedding) is not an error worth failing on.
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
