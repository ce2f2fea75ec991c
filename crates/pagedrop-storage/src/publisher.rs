//! Document publishing
//!
//! [`Publisher`] stages content in a temporary file, uploads it under the configured
//! bucket and returns the public URL. The staged file is owned by a
//! [`NamedTempFile`], so it is removed on every exit path, including a dropped
//! (cancelled) upload future.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use pagedrop_core::StorageConfig;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::bucket::ensure_bucket;
use crate::endpoint::ResolvedEndpoint;
use crate::keys::object_key;
use crate::traits::{ObjectBackend, PutRequest, StorageResult};

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const STAGING_PREFIX: &str = "pagedrop-";

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub url: String,
    pub key: String,
    /// Length of the content in bytes
    pub byte_size: u64,
    /// Hex SHA-256 of the content
    pub sha256: String,
}

/// Uploads documents to the configured bucket
pub struct Publisher {
    endpoint: ResolvedEndpoint,
    base_path: String,
    backend: Arc<dyn ObjectBackend>,
}

impl Publisher {
    /// Resolve the endpoint and connect an S3-protocol client.
    ///
    /// Configuration errors surface here, before any network call.
    #[cfg(feature = "storage-s3")]
    pub async fn new(config: &StorageConfig) -> StorageResult<Self> {
        let endpoint = ResolvedEndpoint::resolve(config)?;
        let backend = crate::s3::S3Backend::new(
            &endpoint,
            &config.access_key_id,
            &config.secret_access_key,
        )
        .await;

        let client_endpoint = endpoint
            .client_endpoint_url()
            .unwrap_or_else(|| "default".to_string());
        info!(
            provider = %endpoint.provider(),
            bucket = %endpoint.bucket(),
            region = %endpoint.client_region(),
            endpoint = %client_endpoint,
            secure = endpoint.is_secure(),
            "Storage client initialized"
        );

        Ok(Self::from_parts(endpoint, config.base_path.clone(), Arc::new(backend)))
    }

    /// Build a publisher over an existing backend.
    pub fn with_backend(
        config: &StorageConfig,
        backend: Arc<dyn ObjectBackend>,
    ) -> StorageResult<Self> {
        let endpoint = ResolvedEndpoint::resolve(config)?;
        Ok(Self::from_parts(endpoint, config.base_path.clone(), backend))
    }

    fn from_parts(
        endpoint: ResolvedEndpoint,
        base_path: String,
        backend: Arc<dyn ObjectBackend>,
    ) -> Self {
        Publisher {
            endpoint,
            base_path,
            backend,
        }
    }

    pub fn endpoint(&self) -> &ResolvedEndpoint {
        &self.endpoint
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Publish an HTML document as `text/html`.
    pub async fn deploy_html(
        &self,
        html: &str,
        remote_dir: &str,
        filename: &str,
    ) -> StorageResult<UploadResult> {
        self.publish(html.as_bytes(), remote_dir, filename, HTML_CONTENT_TYPE)
            .await
    }

    /// Upload `content` as `{base_path}/{remote_dir}/{filename}`.
    pub async fn publish(
        &self,
        content: &[u8],
        remote_dir: &str,
        filename: &str,
        content_type: &str,
    ) -> StorageResult<UploadResult> {
        let key = object_key(&self.base_path, remote_dir, filename)?;
        let bucket = self.endpoint.bucket();
        let byte_size = content.len() as u64;
        let digest = Sha256::digest(content);
        let start = Instant::now();

        let staged = stage(content, filename).await?;
        let checksum_sha256 = self
            .endpoint
            .provider()
            .supports_sha256_checksum()
            .then(|| BASE64.encode(&digest));

        let request = PutRequest {
            bucket: bucket.to_string(),
            key: key.clone(),
            path: staged.path().to_path_buf(),
            content_type: content_type.to_string(),
            content_length: byte_size,
            checksum_sha256,
        };
        let outcome = self.upload_staged(request).await;

        let staged_path = staged.path().to_path_buf();
        if let Err(e) = staged.close() {
            warn!(
                error = %e,
                path = %staged_path.display(),
                "Failed to remove staged upload file"
            );
        }

        if let Err(e) = outcome {
            error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                size_bytes = byte_size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Upload failed"
            );
            return Err(e);
        }

        let url = self.endpoint.url_for(&key);
        info!(
            bucket = %bucket,
            key = %key,
            url = %url,
            size_bytes = byte_size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload successful"
        );

        Ok(UploadResult {
            url,
            key,
            byte_size,
            sha256: hex::encode(&digest),
        })
    }

    async fn upload_staged(&self, request: PutRequest) -> StorageResult<()> {
        ensure_bucket(self.backend.as_ref(), &request.bucket).await?;
        self.backend.put_object(request).await
    }

    /// Check that the backend is reachable with the configured credentials.
    ///
    /// Never fails: any error is logged and reported as `false`.
    pub async fn check_connection(&self) -> bool {
        match self.backend.list_buckets().await {
            Ok(buckets) => {
                debug!(bucket_count = buckets.len(), "Storage connection ok");
                true
            }
            Err(e) => {
                warn!(
                    error = %e,
                    provider = %self.endpoint.provider(),
                    bucket = %self.endpoint.bucket(),
                    "Storage connection check failed"
                );
                false
            }
        }
    }
}

/// Write `content` to a temporary file named after the upload's extension.
async fn stage(content: &[u8], filename: &str) -> StorageResult<NamedTempFile> {
    let suffix = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();

    let staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(&suffix)
        .tempfile()?;

    let mut file = tokio::fs::File::from_std(staged.reopen()?);
    file.write_all(content).await?;
    file.flush().await?;
    Ok(staged)
}
