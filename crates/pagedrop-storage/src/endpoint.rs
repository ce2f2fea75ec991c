//! Storage endpoint resolution
//!
//! Turns a [`StorageConfig`] into the connection parameters for the storage client
//! and the public URL of an uploaded object. Everything here is pure: no network I/O.

use pagedrop_core::{ConfigError, StorageConfig, StorageProvider};

pub const DEFAULT_S3_REGION: &str = "us-east-1";
pub const DEFAULT_OSS_REGION: &str = "cn-hangzhou";
const DEFAULT_GCS_REGION: &str = "auto";
const GCS_INTEROP_ENDPOINT: &str = "https://storage.googleapis.com";
const AWS_DOMAIN_SUFFIX: &str = "amazonaws.com";
const OSS_HOST_MARKER: &str = "oss-";

/// A configured endpoint split into scheme and host.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EndpointParts {
    raw: String,
    scheme: Option<String>,
    /// Endpoint without scheme or trailing slash
    host: String,
}

impl EndpointParts {
    fn parse(raw: &str) -> Self {
        let (scheme, rest) = match raw.split_once("://") {
            Some((scheme, rest)) => (Some(scheme.to_lowercase()), rest),
            None => (None, raw),
        };
        EndpointParts {
            raw: raw.to_string(),
            scheme,
            host: rest.trim_end_matches('/').to_string(),
        }
    }

    fn is_secure(&self) -> bool {
        self.scheme.as_deref() == Some("https")
    }

    /// Scheme used in public URLs; https unless the endpoint names another.
    fn url_scheme(&self) -> &str {
        self.scheme.as_deref().unwrap_or("https")
    }

    /// Scheme used by the client connection; plaintext unless the endpoint is https.
    fn connection_url(&self) -> String {
        let scheme = if self.is_secure() { "https" } else { "http" };
        format!("{}://{}", scheme, self.host)
    }

    fn is_aws(&self) -> bool {
        self.host.ends_with(AWS_DOMAIN_SUFFIX)
    }
}

/// Connection and URL parameters derived once from the configuration.
///
/// The effective region is computed here and kept in this value; the shared
/// configuration is never written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    provider: StorageProvider,
    bucket: String,
    region: Option<String>,
    endpoint: Option<EndpointParts>,
    public_base_url: Option<String>,
}

impl ResolvedEndpoint {
    pub fn resolve(config: &StorageConfig) -> Result<Self, ConfigError> {
        let endpoint = config.endpoint.as_deref().map(EndpointParts::parse);

        let region = match config.provider {
            StorageProvider::Oss => Some(resolve_oss_region(
                config.region.as_deref(),
                config.endpoint.as_deref(),
            )?),
            StorageProvider::S3 | StorageProvider::Gcs => config.region.clone(),
        };

        Ok(ResolvedEndpoint {
            provider: config.provider,
            bucket: config.bucket.clone(),
            region,
            endpoint,
            public_base_url: config.public_base_url.clone(),
        })
    }

    pub fn provider(&self) -> StorageProvider {
        self.provider
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Region as configured, or as resolved for OSS.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Region handed to the storage client, which always needs one.
    pub fn client_region(&self) -> &str {
        match (self.provider, self.region.as_deref()) {
            (_, Some(region)) => region,
            (StorageProvider::S3, None) => DEFAULT_S3_REGION,
            (StorageProvider::Oss, None) => DEFAULT_OSS_REGION,
            (StorageProvider::Gcs, None) => DEFAULT_GCS_REGION,
        }
    }

    /// Configured endpoint with the scheme and trailing slash removed.
    pub fn host(&self) -> Option<&str> {
        self.endpoint.as_ref().map(|e| e.host.as_str())
    }

    /// False when a configured endpoint does not use https.
    pub fn is_secure(&self) -> bool {
        self.endpoint.as_ref().map_or(true, EndpointParts::is_secure)
    }

    /// Endpoint URL for the client, `None` to let the SDK pick the AWS default.
    pub fn client_endpoint_url(&self) -> Option<String> {
        match self.provider {
            StorageProvider::S3 => self.endpoint.as_ref().map(EndpointParts::connection_url),
            StorageProvider::Oss => Some(match &self.endpoint {
                Some(endpoint) => endpoint.connection_url(),
                None => format!("https://oss-{}.aliyuncs.com", self.client_region()),
            }),
            StorageProvider::Gcs => Some(
                self.endpoint
                    .as_ref()
                    .map(EndpointParts::connection_url)
                    .unwrap_or_else(|| GCS_INTEROP_ENDPOINT.to_string()),
            ),
        }
    }

    /// Path-style addressing for S3-compatible servers that lack virtual hosts.
    pub fn force_path_style(&self) -> bool {
        match self.provider {
            StorageProvider::S3 => self.has_custom_s3_endpoint(),
            StorageProvider::Oss => false,
            StorageProvider::Gcs => true,
        }
    }

    /// Location constraint sent with CreateBucket.
    ///
    /// Only AWS needs it, and only outside us-east-1.
    pub fn location_constraint(&self) -> Option<&str> {
        if self.provider != StorageProvider::S3 || self.has_custom_s3_endpoint() {
            return None;
        }
        self.region
            .as_deref()
            .filter(|region| *region != DEFAULT_S3_REGION)
    }

    /// Whether the service accepts the SDK's default flexible checksums.
    ///
    /// Only AWS S3 does; other servers may reject the chunked trailer the SDK sends.
    pub fn supports_flexible_checksums(&self) -> bool {
        self.provider == StorageProvider::S3 && !self.has_custom_s3_endpoint()
    }

    fn has_custom_s3_endpoint(&self) -> bool {
        self.endpoint.as_ref().is_some_and(|e| !e.is_aws())
    }

    /// Public URL of the object stored at `remote_path`.
    pub fn url_for(&self, remote_path: &str) -> String {
        if let Some(base) = &self.public_base_url {
            return format!("{}/{}", base.trim_end_matches('/'), remote_path);
        }

        match self.provider {
            StorageProvider::S3 => match &self.endpoint {
                Some(endpoint) if !endpoint.is_aws() => format!(
                    "{}://{}/{}/{}",
                    endpoint.url_scheme(),
                    endpoint.host,
                    self.bucket,
                    remote_path
                ),
                _ => format!(
                    "https://{}.s3.{}.amazonaws.com/{}",
                    self.bucket,
                    self.region.as_deref().unwrap_or(DEFAULT_S3_REGION),
                    remote_path
                ),
            },
            StorageProvider::Oss => match &self.endpoint {
                Some(endpoint) => {
                    let host = endpoint.host.replacen(
                        OSS_HOST_MARKER,
                        &format!("{}.{}", self.bucket, OSS_HOST_MARKER),
                        1,
                    );
                    format!("{}://{}/{}", endpoint.url_scheme(), host, remote_path)
                }
                None => format!(
                    "https://{}.oss-{}.aliyuncs.com/{}",
                    self.bucket,
                    self.region.as_deref().unwrap_or(DEFAULT_OSS_REGION),
                    remote_path
                ),
            },
            StorageProvider::Gcs => format!(
                "https://{}.{}.com/{}",
                self.bucket, self.provider, remote_path
            ),
        }
    }

    /// Raw endpoint string as configured.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_ref().map(|e| e.raw.as_str())
    }
}

/// OSS region priority: explicit region, then the token after `oss-` in the
/// endpoint, then the default.
fn resolve_oss_region(region: Option<&str>, endpoint: Option<&str>) -> Result<String, ConfigError> {
    if let Some(region) = region {
        return Ok(region.to_string());
    }

    match endpoint {
        Some(endpoint) => {
            let (_, rest) = endpoint.split_once(OSS_HOST_MARKER).ok_or_else(|| {
                ConfigError::InvalidEndpoint(format!(
                    "cannot infer OSS region from '{}': expected an 'oss-<region>' host",
                    endpoint
                ))
            })?;
            let region = rest.split(['.', '/']).next().unwrap_or_default();
            if region.is_empty() {
                return Err(ConfigError::InvalidEndpoint(format!(
                    "empty OSS region in '{}'",
                    endpoint
                )));
            }
            Ok(region.to_string())
        }
        None => Ok(DEFAULT_OSS_REGION.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: StorageProvider) -> StorageConfig {
        StorageConfig {
            provider,
            access_key_id: "test-access-key".to_string(),
            secret_access_key: "test-secret-key".to_string(),
            endpoint: None,
            region: None,
            bucket: "b".to_string(),
            base_path: String::new(),
            public_base_url: None,
        }
    }

    fn resolve(
        provider: StorageProvider,
        endpoint: Option<&str>,
        region: Option<&str>,
    ) -> ResolvedEndpoint {
        let mut config = config(provider);
        config.endpoint = endpoint.map(String::from);
        config.region = region.map(String::from);
        ResolvedEndpoint::resolve(&config).unwrap()
    }

    #[test]
    fn s3_without_endpoint_uses_virtual_host_url() {
        let resolved = resolve(StorageProvider::S3, None, Some("us-east-1"));
        assert_eq!(
            resolved.url_for("x.html"),
            "https://b.s3.us-east-1.amazonaws.com/x.html"
        );
        assert_eq!(resolved.client_endpoint_url(), None);
        assert!(!resolved.force_path_style());
        assert!(resolved.is_secure());
    }

    #[test]
    fn flexible_checksums_only_for_aws_s3() {
        assert!(resolve(StorageProvider::S3, None, None).supports_flexible_checksums());
        assert!(resolve(StorageProvider::S3, Some("https://s3.amazonaws.com"), None)
            .supports_flexible_checksums());
        assert!(!resolve(StorageProvider::S3, Some("http://localhost:9000"), None)
            .supports_flexible_checksums());
        assert!(!resolve(StorageProvider::Oss, None, None).supports_flexible_checksums());
        assert!(!resolve(StorageProvider::Gcs, None, None).supports_flexible_checksums());
    }

    #[test]
    fn s3_without_region_defaults_to_us_east_1() {
        let resolved = resolve(StorageProvider::S3, None, None);
        assert_eq!(resolved.region(), None);
        assert_eq!(resolved.client_region(), "us-east-1");
        assert_eq!(
            resolved.url_for("x.html"),
            "https://b.s3.us-east-1.amazonaws.com/x.html"
        );
    }

    #[test]
    fn s3_custom_endpoint_uses_path_style_url() {
        let resolved = resolve(StorageProvider::S3, Some("https://minio.example.com"), None);
        assert_eq!(resolved.url_for("x.html"), "https://minio.example.com/b/x.html");
        assert_eq!(resolved.host(), Some("minio.example.com"));
        assert!(resolved.is_secure());
        assert!(resolved.force_path_style());
        assert_eq!(
            resolved.client_endpoint_url().as_deref(),
            Some("https://minio.example.com")
        );
    }

    #[test]
    fn s3_custom_endpoint_trailing_slash_and_plain_http() {
        let resolved = resolve(StorageProvider::S3, Some("http://localhost:9000/"), None);
        assert_eq!(resolved.url_for("a/x.html"), "http://localhost:9000/b/a/x.html");
        assert_eq!(resolved.host(), Some("localhost:9000"));
        assert!(!resolved.is_secure());
        assert_eq!(
            resolved.client_endpoint_url().as_deref(),
            Some("http://localhost:9000")
        );
    }

    #[test]
    fn s3_bare_host_endpoint_defaults_url_scheme_to_https() {
        let resolved = resolve(StorageProvider::S3, Some("minio.example.com"), None);
        assert_eq!(resolved.url_for("x.html"), "https://minio.example.com/b/x.html");
        // connection is only secure when https is spelled out
        assert!(!resolved.is_secure());
    }

    #[test]
    fn s3_aws_endpoint_keeps_virtual_host_url() {
        let resolved = resolve(
            StorageProvider::S3,
            Some("https://s3.amazonaws.com"),
            Some("us-west-2"),
        );
        assert_eq!(
            resolved.url_for("documents/test.txt"),
            "https://b.s3.us-west-2.amazonaws.com/documents/test.txt"
        );
        assert_eq!(resolved.host(), Some("s3.amazonaws.com"));
        assert!(!resolved.force_path_style());
        assert_eq!(resolved.location_constraint(), Some("us-west-2"));
    }

    #[test]
    fn s3_location_constraint_only_outside_us_east_1() {
        assert_eq!(
            resolve(StorageProvider::S3, None, Some("us-east-1")).location_constraint(),
            None
        );
        assert_eq!(
            resolve(StorageProvider::S3, None, Some("eu-west-1")).location_constraint(),
            Some("eu-west-1")
        );
        assert_eq!(
            resolve(
                StorageProvider::S3,
                Some("http://localhost:9000"),
                Some("eu-west-1")
            )
            .location_constraint(),
            None
        );
    }

    #[test]
    fn oss_region_extracted_from_endpoint() {
        let resolved = resolve(
            StorageProvider::Oss,
            Some("https://oss-cn-hangzhou.aliyuncs.com"),
            None,
        );
        assert_eq!(resolved.region(), Some("cn-hangzhou"));
        assert_eq!(
            resolved.url_for("x.html"),
            "https://b.oss-cn-hangzhou.aliyuncs.com/x.html"
        );
        assert_eq!(
            resolved.client_endpoint_url().as_deref(),
            Some("https://oss-cn-hangzhou.aliyuncs.com")
        );
        assert!(!resolved.force_path_style());
    }

    #[test]
    fn oss_without_endpoint_or_region_defaults_region() {
        let resolved = resolve(StorageProvider::Oss, None, None);
        assert_eq!(resolved.region(), Some("cn-hangzhou"));
        assert_eq!(
            resolved.url_for("documents/test.txt"),
            "https://b.oss-cn-hangzhou.aliyuncs.com/documents/test.txt"
        );
        assert_eq!(
            resolved.client_endpoint_url().as_deref(),
            Some("https://oss-cn-hangzhou.aliyuncs.com")
        );
    }

    #[test]
    fn oss_explicit_region_wins_over_endpoint() {
        let resolved = resolve(
            StorageProvider::Oss,
            Some("https://oss-cn-hangzhou.aliyuncs.com"),
            Some("cn-shanghai"),
        );
        assert_eq!(resolved.region(), Some("cn-shanghai"));
        // the URL still follows the endpoint host
        assert_eq!(
            resolved.url_for("x.html"),
            "https://b.oss-cn-hangzhou.aliyuncs.com/x.html"
        );
    }

    #[test]
    fn oss_explicit_region_without_endpoint() {
        let resolved = resolve(StorageProvider::Oss, None, Some("cn-beijing"));
        assert_eq!(
            resolved.url_for("x.html"),
            "https://b.oss-cn-beijing.aliyuncs.com/x.html"
        );
    }

    #[test]
    fn oss_endpoint_without_marker_is_config_error() {
        let mut config = config(StorageProvider::Oss);
        config.endpoint = Some("https://storage.example.com".to_string());
        let err = ResolvedEndpoint::resolve(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint(_)));
    }

    #[test]
    fn oss_endpoint_without_marker_is_fine_with_explicit_region() {
        let resolved = resolve(
            StorageProvider::Oss,
            Some("https://storage.example.com/"),
            Some("cn-hangzhou"),
        );
        assert_eq!(resolved.url_for("x.html"), "https://storage.example.com/x.html");
    }

    #[test]
    fn oss_resolution_leaves_config_untouched() {
        let config = config(StorageProvider::Oss);
        let resolved = ResolvedEndpoint::resolve(&config).unwrap();
        assert_eq!(resolved.region(), Some("cn-hangzhou"));
        assert_eq!(config.region, None);
    }

    #[test]
    fn gcs_uses_generic_url_and_interop_endpoint() {
        let resolved = resolve(StorageProvider::Gcs, None, None);
        assert_eq!(resolved.url_for("x.html"), "https://b.gcs.com/x.html");
        assert_eq!(resolved.client_region(), "auto");
        assert_eq!(
            resolved.client_endpoint_url().as_deref(),
            Some("https://storage.googleapis.com")
        );
        assert!(resolved.force_path_style());
        assert_eq!(resolved.location_constraint(), None);
    }

    #[test]
    fn public_base_url_overrides_derivation() {
        let mut config = config(StorageProvider::S3);
        config.public_base_url = Some("https://cdn.example.com/".to_string());
        let resolved = ResolvedEndpoint::resolve(&config).unwrap();
        assert_eq!(
            resolved.url_for("pages/x.html"),
            "https://cdn.example.com/pages/x.html"
        );
    }

    #[test]
    fn url_derivation_is_deterministic() {
        let resolved = resolve(StorageProvider::Oss, Some("oss-cn-hangzhou.aliyuncs.com"), None);
        let first = resolved.url_for("x.html");
        assert_eq!(first, resolved.url_for("x.html"));
        assert_eq!(first, "https://b.oss-cn-hangzhou.aliyuncs.com/x.html");
    }
}
