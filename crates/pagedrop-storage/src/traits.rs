//! Object backend abstraction
//!
//! This module defines the ObjectBackend trait that the publisher talks to, and the
//! error type shared by every storage operation.

use std::path::PathBuf;

use async_trait::async_trait;
use pagedrop_core::ConfigError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("{operation} failed{}: {message}", status_suffix(.status, .code))]
    Backend {
        operation: &'static str,
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    #[error("Bucket already owned by this account: {0}")]
    BucketAlreadyOwned(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    /// HTTP status reported by the backend, when the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            StorageError::Backend { status, .. } => *status,
            _ => None,
        }
    }
}

fn status_suffix(status: &Option<u16>, code: &Option<String>) -> String {
    match (status, code) {
        (Some(status), Some(code)) => format!(" (HTTP {} {})", status, code),
        (Some(status), None) => format!(" (HTTP {})", status),
        (None, Some(code)) => format!(" ({})", code),
        (None, None) => String::new(),
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Outcome of a bucket lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketLookup {
    Exists,
    Missing,
}

/// A staged file to be stored under `key`.
#[derive(Debug, Clone)]
pub struct PutRequest {
    pub bucket: String,
    pub key: String,
    /// Local file holding the object body
    pub path: PathBuf,
    pub content_type: String,
    pub content_length: u64,
    /// Base64 SHA-256 of the body, sent as the expected checksum when present
    pub checksum_sha256: Option<String>,
}

/// Object storage backend
///
/// Implemented over the S3 wire protocol for real providers and in memory for tests.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Look up a bucket by name.
    async fn head_bucket(&self, bucket: &str) -> StorageResult<BucketLookup>;

    /// Create a bucket.
    ///
    /// Returns `StorageError::BucketAlreadyOwned` when the bucket already exists and
    /// belongs to the caller.
    async fn create_bucket(&self, bucket: &str) -> StorageResult<()>;

    /// Upload the staged file described by `request`.
    async fn put_object(&self, request: PutRequest) -> StorageResult<()>;

    /// List bucket names visible to the credentials.
    async fn list_buckets(&self) -> StorageResult<Vec<String>>;
}
