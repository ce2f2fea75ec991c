//! Pagedrop Storage Library
//!
//! Publishes in-memory documents to S3-protocol object storage and derives their
//! public URLs.
//!
//! # Object key format
//!
//! Keys are `{base_path}/{remote_dir}/{filename}` with every segment trimmed of
//! slashes and empty segments dropped, so a key never has a leading or doubled `/`.
//! Key building lives in the `keys` module so URL derivation and uploads agree.

pub mod bucket;
pub mod endpoint;
pub mod keys;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod publisher;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use endpoint::ResolvedEndpoint;
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryBackend;
pub use pagedrop_core::{ConfigError, StorageConfig, StorageProvider};
pub use publisher::{Publisher, UploadResult};
#[cfg(feature = "storage-s3")]
pub use s3::S3Backend;
pub use traits::{BucketLookup, ObjectBackend, PutRequest, StorageError, StorageResult};
