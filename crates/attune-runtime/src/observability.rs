//! Logging setup
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the embedding application, which can use `init_logging` for the usual
//! fmt/JSON output.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::LoggingConfig;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("invalid log directive: {0}")]
    InvalidDirective(String),

    #[error("global subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Install the global tracing subscriber
///
/// `RUST_LOG`, when set and valid, takes precedence over `config.level`.
/// Fails instead of panicking when a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| LoggingError::InvalidDirective(e.to_string()))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))
}
