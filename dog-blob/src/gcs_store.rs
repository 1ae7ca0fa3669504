use async_trait::async_trait;
use futures_util::TryStreamExt;
use opendal::{services, ErrorKind, Operator};
use tracing::debug;

use crate::store::{BlobInfo, BlobStore, ObjectHead};
use crate::{BlobError, BlobResult, ByteStream};

/// Connection settings for Google Cloud Storage
///
/// Without an explicit credential the Application Default Credentials
/// chain applies (`GOOGLE_APPLICATION_CREDENTIALS`, then VM metadata).
#[derive(Debug, Clone)]
pub struct GcsConfig {
    pub bucket: String,
    pub endpoint: Option<String>,
    /// Path to a service account JSON file
    pub credential_path: Option<String>,
    /// Base64-encoded service account JSON
    pub credential: Option<String>,
}

impl GcsConfig {
    pub fn new<S: Into<String>>(bucket: S) -> Self {
        Self {
            bucket: bucket.into(),
            endpoint: None,
            credential_path: None,
            credential: None,
        }
    }

    /// Read `GCS_*` variables; `BUCKET_NAME` is accepted when `GCS_BUCKET` is unset.
    pub fn from_lookup<F>(lookup: F) -> BlobResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bucket = lookup("GCS_BUCKET")
            .or_else(|| lookup("BUCKET_NAME"))
            .ok_or_else(|| {
                BlobError::invalid("GCS_BUCKET or BUCKET_NAME environment variable required")
            })?;

        let mut config = Self::new(bucket);
        config.endpoint = lookup("GCS_ENDPOINT");
        config.credential_path = lookup("GOOGLE_APPLICATION_CREDENTIALS");
        config.credential = lookup("GCS_CREDENTIAL");
        Ok(config)
    }
}

/// Native GCS store over the JSON API, via opendal
#[derive(Clone)]
pub struct GcsStore {
    op: Operator,
}

impl GcsStore {
    pub fn new(config: GcsConfig) -> BlobResult<Self> {
        let mut builder = services::Gcs::default().bucket(&config.bucket);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint(endpoint);
        }
        if let Some(path) = &config.credential_path {
            builder = builder.credential_path(path);
        }
        if let Some(credential) = &config.credential {
            builder = builder.credential(credential);
        }

        let op = Operator::new(builder).map_err(BlobError::backend)?.finish();
        Ok(Self { op })
    }

    /// Wrap an already configured operator
    pub fn from_operator(op: Operator) -> Self {
        Self { op }
    }

    fn map_error(key: &str, err: opendal::Error) -> BlobError {
        match err.kind() {
            ErrorKind::NotFound => BlobError::not_found(key),
            _ => BlobError::backend(err),
        }
    }
}

#[async_trait]
impl BlobStore for GcsStore {
    async fn exists(&self, key: &str) -> BlobResult<bool> {
        self.op.exists(key).await.map_err(BlobError::backend)
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        let meta = self
            .op
            .stat(key)
            .await
            .map_err(|err| Self::map_error(key, err))?;

        Ok(ObjectHead {
            size_bytes: meta.content_length(),
            content_type: meta.content_type().map(str::to_string),
            etag: meta.etag().map(str::to_string),
            last_modified: meta.last_modified(),
        })
    }

    async fn read_range(&self, key: &str, start: u64, end: u64) -> BlobResult<ByteStream> {
        debug!(key, start, end, "gcs ranged read");

        let reader = self
            .op
            .reader(key)
            .await
            .map_err(|err| Self::map_error(key, err))?;
        let stream = reader
            .into_bytes_stream(start..end + 1)
            .await
            .map_err(|err| Self::map_error(key, err))?;

        Ok(Box::pin(stream))
    }

    async fn list(&self, prefix: &str, limit: usize) -> BlobResult<Vec<BlobInfo>> {
        let mut lister = self
            .op
            .lister_with(prefix)
            .recursive(true)
            .await
            .map_err(BlobError::backend)?;

        let mut out = Vec::new();
        while out.len() < limit {
            let Some(entry) = lister.try_next().await.map_err(BlobError::backend)? else {
                break;
            };
            let meta = entry.metadata();
            if meta.is_dir() {
                continue;
            }
            out.push(BlobInfo {
                key: entry.path().to_string(),
                size_bytes: meta.content_length(),
                etag: meta.etag().map(str::to_string),
                last_modified: meta.last_modified(),
            });
        }
        Ok(out)
    }
}
