use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// Object storage providers
///
/// Every provider is reached over the S3 wire protocol; they differ in how the
/// region is found and how public object URLs are shaped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    /// Amazon S3 or an S3-compatible server (MinIO, Ceph, ...)
    #[default]
    S3,
    /// Aliyun Object Storage Service
    Oss,
    /// Google Cloud Storage through its XML interoperability API
    Gcs,
}

impl StorageProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageProvider::S3 => "s3",
            StorageProvider::Oss => "oss",
            StorageProvider::Gcs => "gcs",
        }
    }

    /// Whether uploads carry an expected SHA-256 checksum header.
    pub fn supports_sha256_checksum(&self) -> bool {
        matches!(self, StorageProvider::S3)
    }
}

impl FromStr for StorageProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s3" => Ok(StorageProvider::S3),
            "oss" | "aliyun" => Ok(StorageProvider::Oss),
            "gcs" | "google" => Ok(StorageProvider::Gcs),
            _ => Err(ConfigError::UnsupportedProvider(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for StorageProvider {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Display for StorageProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
