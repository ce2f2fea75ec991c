//! Pagedrop Core Library
//!
//! Configuration, provider types and error types shared by the storage layer
//! and the MCP server.

pub mod config;
pub mod error;
pub mod provider;

// Re-export commonly used types
pub use config::{write_sample_config, ServerConfig, StorageConfig};
pub use error::ConfigError;
pub use provider::StorageProvider;
