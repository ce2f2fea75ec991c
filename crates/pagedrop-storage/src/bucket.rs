//! Bucket lookup and creation.

use tracing::{info, warn};

use crate::traits::{BucketLookup, ObjectBackend, StorageError, StorageResult};

/// What [`ensure_bucket`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    Existing,
    Created,
}

/// Make sure `bucket` exists, creating it when the lookup reports it missing.
///
/// A create that loses a race against another caller creating the same bucket under
/// the same account counts as success. Any other backend error is returned as is.
pub async fn ensure_bucket(backend: &dyn ObjectBackend, bucket: &str) -> StorageResult<BucketStatus> {
    match backend.head_bucket(bucket).await? {
        BucketLookup::Exists => Ok(BucketStatus::Existing),
        BucketLookup::Missing => {
            info!(bucket = %bucket, "Bucket not found, creating it");
            match backend.create_bucket(bucket).await {
                Ok(()) => {
                    info!(bucket = %bucket, "Bucket created");
                    Ok(BucketStatus::Created)
                }
                Err(StorageError::BucketAlreadyOwned(_)) => {
                    warn!(bucket = %bucket, "Bucket was created concurrently, using it");
                    Ok(BucketStatus::Existing)
                }
                Err(e) => Err(e),
            }
        }
    }
}
