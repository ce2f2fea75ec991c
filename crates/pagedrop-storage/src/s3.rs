use std::error::Error as StdError;

use async_trait::async_trait;
use aws_config::retry::{RetryConfig, RetryMode};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::{
    Credentials, Region, RequestChecksumCalculation, ResponseChecksumValidation,
};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;

use crate::endpoint::ResolvedEndpoint;
use crate::traits::{BucketLookup, ObjectBackend, PutRequest, StorageError, StorageResult};

const CREDENTIALS_PROVIDER_NAME: &str = "pagedrop-static";

/// S3-protocol backend
///
/// Serves every provider: AWS S3 and S3-compatible servers, Aliyun OSS and GCS
/// through their S3-compatible endpoints.
#[derive(Clone)]
pub struct S3Backend {
    client: Client,
    location_constraint: Option<String>,
}

impl S3Backend {
    /// Create a new S3Backend
    ///
    /// # Arguments
    /// * `endpoint` - Resolved region, endpoint and addressing style
    /// * `access_key_id` / `secret_access_key` - Static credentials for the provider
    pub async fn new(
        endpoint: &ResolvedEndpoint,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Self {
        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let retry_config = RetryConfig::standard()
            .with_max_attempts(5)
            .with_retry_mode(RetryMode::Adaptive);

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(endpoint.client_region().to_string()))
            .credentials_provider(credentials)
            .retry_config(retry_config)
            .load()
            .await;

        let mut s3_config_builder =
            aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(endpoint.force_path_style());
        if let Some(url) = endpoint.client_endpoint_url() {
            s3_config_builder = s3_config_builder.endpoint_url(url);
        }
        if !endpoint.supports_flexible_checksums() {
            s3_config_builder = s3_config_builder
                .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
                .response_checksum_validation(ResponseChecksumValidation::WhenRequired);
        }

        S3Backend {
            client: Client::from_conf(s3_config_builder.build()),
            location_constraint: endpoint.location_constraint().map(String::from),
        }
    }
}

/// Convert an SDK failure into a `StorageError::Backend`, keeping the HTTP status,
/// the service error code and message.
fn backend_error<E>(operation: &'static str, err: SdkError<E, HttpResponse>) -> StorageError
where
    E: ProvideErrorMetadata + StdError + Send + Sync + 'static,
{
    let status = err.raw_response().map(|response| response.status().as_u16());
    let code = err.code().map(String::from);
    let message = err
        .message()
        .map(String::from)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

    StorageError::Backend {
        operation,
        status,
        code,
        message,
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    async fn head_bucket(&self, bucket: &str) -> StorageResult<BucketLookup> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(BucketLookup::Exists),
            Err(err) => {
                let not_found = err.as_service_error().is_some_and(|e| e.is_not_found())
                    || err.raw_response().map(|r| r.status().as_u16()) == Some(404);
                if not_found {
                    Ok(BucketLookup::Missing)
                } else {
                    Err(backend_error("HeadBucket", err))
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str) -> StorageResult<()> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if let Some(region) = &self.location_constraint {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_bucket_already_owned_by_you()) =>
            {
                Err(StorageError::BucketAlreadyOwned(bucket.to_string()))
            }
            Err(err) => Err(backend_error("CreateBucket", err)),
        }
    }

    async fn put_object(&self, request: PutRequest) -> StorageResult<()> {
        let body = ByteStream::from_path(&request.path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "failed to open staged file {}: {}",
                request.path.display(),
                e
            ))
        })?;

        let mut put = self
            .client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .body(body)
            .content_type(&request.content_type)
            .content_length(request.content_length as i64);
        if let Some(checksum) = &request.checksum_sha256 {
            put = put.checksum_sha256(checksum);
        }

        put.send()
            .await
            .map_err(|e| backend_error("PutObject", e))?;
        Ok(())
    }

    async fn list_buckets(&self) -> StorageResult<Vec<String>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| backend_error("ListBuckets", e))?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(String::from))
            .collect())
    }
}
