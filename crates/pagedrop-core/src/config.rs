//! Configuration module
//!
//! Storage and server configuration. Values come from `PAGEDROP_*` environment
//! variables when present, otherwise from a YAML file. The loaded value is passed
//! explicitly to the components that need it; there is no process-wide instance.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::provider::StorageProvider;

const ENV_PREFIX: &str = "PAGEDROP_";
const CONFIG_PATH_VAR: &str = "PAGEDROP_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "config.yaml";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Object storage settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(rename = "remote_type", alias = "provider", default)]
    pub provider: StorageProvider,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Custom service endpoint, with or without a scheme
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub bucket: String,
    /// Key prefix applied to every uploaded object
    #[serde(default)]
    pub base_path: String,
    /// Public URL prefix that replaces the derived object URL (CDN, custom domain)
    #[serde(
        rename = "base_url",
        alias = "public_base_url",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub public_base_url: Option<String>,
}

impl StorageConfig {
    /// Trim fields, drop empty optionals and check required values.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        self.access_key_id = self.access_key_id.trim().to_string();
        self.secret_access_key = self.secret_access_key.trim().to_string();
        self.bucket = self.bucket.trim().to_string();
        self.base_path = self.base_path.trim().to_string();
        self.endpoint = non_empty(self.endpoint);
        self.region = non_empty(self.region);
        self.public_base_url = non_empty(self.public_base_url);

        if self.bucket.is_empty() {
            return Err(ConfigError::MissingField("bucket"));
        }
        if self.access_key_id.is_empty() {
            return Err(ConfigError::MissingField("access_key_id"));
        }
        if self.secret_access_key.is_empty() {
            return Err(ConfigError::MissingField("secret_access_key"));
        }

        if let Some(endpoint) = &self.endpoint {
            if let Some((scheme, rest)) = endpoint.split_once("://") {
                if scheme != "http" && scheme != "https" {
                    return Err(ConfigError::InvalidEndpoint(format!(
                        "unsupported scheme '{}' in {}",
                        scheme, endpoint
                    )));
                }
                if rest.trim_matches('/').is_empty() {
                    return Err(ConfigError::InvalidEndpoint(format!(
                        "missing host in {}",
                        endpoint
                    )));
                }
            }
        }

        Ok(self)
    }
}

// Keeps the secret out of logs.
impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("provider", &self.provider)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("base_path", &self.base_path)
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

/// MCP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(alias = "libcloud")]
    pub storage: StorageConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Flat view of the `PAGEDROP_*` variables.
#[derive(Debug, Default)]
struct EnvVars {
    remote_type: Option<String>,
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    endpoint: Option<String>,
    region: Option<String>,
    bucket: Option<String>,
    base_path: Option<String>,
    base_url: Option<String>,
    log_level: Option<String>,
}

impl EnvVars {
    fn collect<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut env_vars = EnvVars::default();
        for (name, value) in vars {
            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let slot = match key {
                "REMOTE_TYPE" => &mut env_vars.remote_type,
                "ACCESS_KEY_ID" => &mut env_vars.access_key_id,
                "SECRET_ACCESS_KEY" => &mut env_vars.secret_access_key,
                "ENDPOINT" => &mut env_vars.endpoint,
                "REGION" => &mut env_vars.region,
                "BUCKET" => &mut env_vars.bucket,
                "BASE_PATH" => &mut env_vars.base_path,
                "BASE_URL" => &mut env_vars.base_url,
                "LOG_LEVEL" => &mut env_vars.log_level,
                _ => continue,
            };
            *slot = Some(value);
        }
        env_vars
    }

    fn has_storage_settings(&self) -> bool {
        [
            &self.remote_type,
            &self.access_key_id,
            &self.secret_access_key,
            &self.endpoint,
            &self.region,
            &self.bucket,
        ]
        .iter()
        .any(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

impl ServerConfig {
    /// Load configuration.
    ///
    /// Resolution order: `explicit_path`, then `PAGEDROP_*` environment variables,
    /// then the file named by `PAGEDROP_CONFIG`, then `config.yaml`.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        if let Some(config) = Self::from_env()? {
            return Ok(config);
        }

        let path = env::var(CONFIG_PATH_VAR)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::from_file(&path)
    }

    /// Read configuration from the process environment.
    ///
    /// Returns `Ok(None)` when no storage variable is set.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_vars(env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Option<Self>, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars = EnvVars::collect(vars);
        if !vars.has_storage_settings() {
            return Ok(None);
        }

        let provider = match vars.remote_type.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw.parse()?,
            _ => StorageProvider::default(),
        };

        let storage = StorageConfig {
            provider,
            access_key_id: vars
                .access_key_id
                .ok_or(ConfigError::MissingField("access_key_id"))?,
            secret_access_key: vars
                .secret_access_key
                .ok_or(ConfigError::MissingField("secret_access_key"))?,
            endpoint: vars.endpoint,
            region: vars.region,
            bucket: vars.bucket.ok_or(ConfigError::MissingField("bucket"))?,
            base_path: vars.base_path.unwrap_or_default(),
            public_base_url: vars.base_url,
        }
        .validated()?;

        Ok(Some(ServerConfig {
            storage,
            log_level: non_empty(vars.log_level).unwrap_or_else(default_log_level),
        }))
    }

    /// Read configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = serde_yaml::from_str(raw)?;
        Ok(ServerConfig {
            storage: config.storage.validated()?,
            log_level: config.log_level,
        })
    }

    pub fn sample() -> Self {
        ServerConfig {
            storage: StorageConfig {
                provider: StorageProvider::S3,
                access_key_id: "your_access_key_id".to_string(),
                secret_access_key: "your_secret_access_key".to_string(),
                endpoint: Some("https://s3.amazonaws.com".to_string()),
                region: Some("us-east-1".to_string()),
                bucket: "your-bucket-name".to_string(),
                base_path: "uploads".to_string(),
                public_base_url: None,
            },
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Write a sample configuration file that [`ServerConfig::from_file`] accepts.
pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    let yaml = serde_yaml::to_string(&ServerConfig::sample())?;
    fs::write(path, yaml).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn from_vars_reads_prefixed_settings() {
        let config = ServerConfig::from_vars(vars(&[
            ("PAGEDROP_REMOTE_TYPE", "oss"),
            ("PAGEDROP_ACCESS_KEY_ID", "ak"),
            ("PAGEDROP_SECRET_ACCESS_KEY", "sk"),
            ("PAGEDROP_BUCKET", "pages"),
            ("PAGEDROP_BASE_PATH", "/site/"),
            ("PAGEDROP_LOG_LEVEL", "debug"),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(config.storage.provider, StorageProvider::Oss);
        assert_eq!(config.storage.access_key_id, "ak");
        assert_eq!(config.storage.bucket, "pages");
        assert_eq!(config.storage.base_path, "/site/");
        assert_eq!(config.storage.endpoint, None);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn from_vars_without_storage_settings_is_none() {
        let config =
            ServerConfig::from_vars(vars(&[("PAGEDROP_LOG_LEVEL", "debug"), ("HOME", "/root")]))
                .unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn from_vars_defaults_to_s3() {
        let config = ServerConfig::from_vars(vars(&[
            ("PAGEDROP_ACCESS_KEY_ID", "ak"),
            ("PAGEDROP_SECRET_ACCESS_KEY", "sk"),
            ("PAGEDROP_BUCKET", "b"),
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(config.storage.provider, StorageProvider::S3);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn from_vars_reports_missing_bucket() {
        let err = ServerConfig::from_vars(vars(&[
            ("PAGEDROP_ACCESS_KEY_ID", "ak"),
            ("PAGEDROP_SECRET_ACCESS_KEY", "sk"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("bucket")));
    }

    #[test]
    fn from_vars_rejects_unknown_provider() {
        let err = ServerConfig::from_vars(vars(&[
            ("PAGEDROP_REMOTE_TYPE", "dropbox"),
            ("PAGEDROP_ACCESS_KEY_ID", "ak"),
            ("PAGEDROP_SECRET_ACCESS_KEY", "sk"),
            ("PAGEDROP_BUCKET", "b"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedProvider(_)));
    }

    #[test]
    fn from_yaml_accepts_legacy_section_name() {
        let raw = r#"
libcloud:
  remote_name: myremote
  remote_type: s3
  access_key_id: test_key
  secret_access_key: test_secret
  bucket: test-bucket
  base_path: uploads
log_level: DEBUG
"#;
        let config = ServerConfig::from_yaml(raw).unwrap();
        assert_eq!(config.storage.bucket, "test-bucket");
        assert_eq!(config.storage.base_path, "uploads");
        assert_eq!(config.log_level, "DEBUG");
    }

    #[test]
    fn from_yaml_defaults_optional_fields() {
        let raw = r#"
storage:
  remote_type: s3
  access_key_id: k
  secret_access_key: s
  bucket: b
  endpoint: ""
"#;
        let config = ServerConfig::from_yaml(raw).unwrap();
        assert_eq!(config.storage.base_path, "");
        assert_eq!(config.storage.endpoint, None);
        assert_eq!(config.storage.region, None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn from_yaml_rejects_unsupported_provider() {
        let raw = r#"
storage:
  remote_type: ftp
  access_key_id: k
  secret_access_key: s
  bucket: b
"#;
        let err = ServerConfig::from_yaml(raw).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(ref msg) if msg.contains("ftp")));
    }

    #[test]
    fn from_yaml_rejects_malformed_document() {
        let err = ServerConfig::from_yaml("invalid: yaml: content: [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validated_rejects_blank_credentials() {
        let mut storage = ServerConfig::sample().storage;
        storage.secret_access_key = "   ".to_string();
        let err = storage.validated().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("secret_access_key")));
    }

    #[test]
    fn validated_rejects_unknown_endpoint_scheme() {
        let mut storage = ServerConfig::sample().storage;
        storage.endpoint = Some("ftp://files.example.com".to_string());
        let err = storage.validated().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint(_)));
    }

    #[test]
    fn from_file_missing_is_not_found() {
        let err = ServerConfig::from_file(Path::new("nonexistent_config.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn sample_config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml.sample");
        write_sample_config(&path).unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config, ServerConfig::sample());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let rendered = format!("{:?}", ServerConfig::sample().storage);
        assert!(!rendered.contains("your_secret_access_key"));
        assert!(rendered.contains("<redacted>"));
    }
}
