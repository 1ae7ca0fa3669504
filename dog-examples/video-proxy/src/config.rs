use std::str::FromStr;
use std::time::Duration;

use dog_blob::BlobConfig;
use dog_core::DogConfig;

/// Prefix for structured overrides, e.g. `VIDEO_PROXY__BLOB__CHUNK_SIZE`.
pub const ENV_PREFIX: &str = "VIDEO_PROXY";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BUCKET: &str = "propmatch_frontend";

/// Which object store serves the bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Google Cloud Storage with Application Default Credentials
    #[default]
    Gcs,
    /// AWS S3 or any S3-compatible endpoint
    S3,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gcs" | "google" => Ok(Self::Gcs),
            "s3" => Ok(Self::S3),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub host: String,
    pub port: u16,
    pub backend: StorageBackend,
    pub bucket: String,
    pub blob: BlobConfig,
}

impl ProxySettings {
    pub fn from_env() -> Self {
        Self::load(DogConfig::from_env(ENV_PREFIX), |key| std::env::var(key).ok())
    }

    /// Structured keys win; plain deployment variables (`PORT`, `BUCKET_NAME`, ...)
    /// fill whatever is left.
    pub fn load<F>(mut config: DogConfig, fallback: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for (key, var) in [
            ("http.host", "HTTP_HOST"),
            ("http.port", "PORT"),
            ("blob.backend", "STORAGE_BACKEND"),
            ("blob.bucket", "GCS_BUCKET"),
            ("blob.bucket", "S3_BUCKET"),
            ("blob.bucket", "BUCKET_NAME"),
        ] {
            if let Some(value) = fallback(var) {
                config.set_default(key, value);
            }
        }

        let defaults = BlobConfig::default();
        let mut blob = BlobConfig::default()
            .with_chunk_size(config.get_u64("blob.chunk_size").unwrap_or(defaults.chunk_size))
            .with_metadata_ttl(
                config
                    .get_duration_secs("blob.metadata_ttl_secs")
                    .unwrap_or(defaults.metadata_ttl),
            )
            .with_cache_capacity(
                config
                    .get_usize("blob.cache_capacity")
                    .unwrap_or(defaults.cache_capacity),
            )
            .with_backend_timeout(
                config
                    .get_duration_secs("blob.backend_timeout_secs")
                    .unwrap_or(defaults.backend_timeout),
            );

        if let Some(prefix) = config.get_string("blob.prefix") {
            blob = blob.with_key_prefix(prefix);
        }
        if let Some(ttl) = config.get_duration_secs("blob.negative_ttl_secs") {
            if ttl > Duration::ZERO {
                blob = blob.with_negative_ttl(ttl);
            }
        }

        Self {
            host: config
                .get_string("http.host")
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: config
                .get("http.port")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            backend: config
                .get("blob.backend")
                .and_then(|b| b.parse().ok())
                .unwrap_or_default(),
            bucket: config
                .get_string("blob.bucket")
                .unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            blob,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
