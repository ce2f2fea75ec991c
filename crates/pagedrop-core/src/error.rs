//! Configuration error types

use std::io;
use std::path::PathBuf;

/// Errors raised while loading or validating configuration.
///
/// These are fatal to construction: they surface at startup and are never retried.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read configuration file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write configuration file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration format: {0}")]
    Parse(String),

    #[error("Missing required configuration field: {0}")]
    MissingField(&'static str),

    #[error("Unsupported storage provider: {0}")]
    UnsupportedProvider(String),

    #[error("Invalid storage endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
