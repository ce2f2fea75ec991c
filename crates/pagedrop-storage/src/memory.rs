//! In-memory object backend for tests.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::traits::{BucketLookup, ObjectBackend, PutRequest, StorageError, StorageResult};

/// An object recorded by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub checksum_sha256: Option<String>,
    /// Path of the staged file the body was read from
    pub staged_path: PathBuf,
}

#[derive(Default)]
struct State {
    buckets: BTreeSet<String>,
    objects: BTreeMap<(String, String), StoredObject>,
    create_calls: usize,
    staged_paths: Vec<PathBuf>,
    head_error: Option<StorageError>,
    create_error: Option<StorageError>,
    put_error: Option<StorageError>,
    list_error: Option<StorageError>,
}

/// Backend that keeps buckets and objects in memory.
///
/// Each `fail_*_with` call arms a single failure for the next matching operation.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(bucket: &str) -> Self {
        let backend = Self::new();
        backend.state().buckets.insert(bucket.to_string());
        backend
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        // a panicking test thread must not hide the recorded state from the others
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn fail_head_with(&self, err: StorageError) {
        self.state().head_error = Some(err);
    }

    pub fn fail_create_with(&self, err: StorageError) {
        self.state().create_error = Some(err);
    }

    pub fn fail_put_with(&self, err: StorageError) {
        self.state().put_error = Some(err);
    }

    pub fn fail_list_with(&self, err: StorageError) {
        self.state().list_error = Some(err);
    }

    pub fn create_calls(&self) -> usize {
        self.state().create_calls
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.state()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Staged file paths seen by `put_object`, in call order.
    pub fn staged_paths(&self) -> Vec<PathBuf> {
        self.state().staged_paths.clone()
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn head_bucket(&self, bucket: &str) -> StorageResult<BucketLookup> {
        let mut state = self.state();
        if let Some(err) = state.head_error.take() {
            return Err(err);
        }
        Ok(if state.buckets.contains(bucket) {
            BucketLookup::Exists
        } else {
            BucketLookup::Missing
        })
    }

    async fn create_bucket(&self, bucket: &str) -> StorageResult<()> {
        let mut state = self.state();
        state.create_calls += 1;
        if let Some(err) = state.create_error.take() {
            return Err(err);
        }
        if !state.buckets.insert(bucket.to_string()) {
            return Err(StorageError::BucketAlreadyOwned(bucket.to_string()));
        }
        Ok(())
    }

    async fn put_object(&self, request: PutRequest) -> StorageResult<()> {
        // read before taking the lock; the staged file must exist during the call
        let body = tokio::fs::read(&request.path).await?;

        let mut state = self.state();
        state.staged_paths.push(request.path.clone());
        if let Some(err) = state.put_error.take() {
            return Err(err);
        }
        if !state.buckets.contains(&request.bucket) {
            return Err(StorageError::Backend {
                operation: "PutObject",
                status: Some(404),
                code: Some("NoSuchBucket".to_string()),
                message: format!("bucket {} does not exist", request.bucket),
            });
        }
        state.objects.insert(
            (request.bucket, request.key),
            StoredObject {
                body,
                content_type: request.content_type,
                checksum_sha256: request.checksum_sha256,
                staged_path: request.path,
            },
        );
        Ok(())
    }

    async fn list_buckets(&self) -> StorageResult<Vec<String>> {
        let mut state = self.state();
        if let Some(err) = state.list_error.take() {
            return Err(err);
        }
        Ok(state.buckets.iter().cloned().collect())
    }
}
