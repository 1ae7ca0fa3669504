use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{BlobError, BlobResult, ByteStream};

/// Read-side storage operations - must be implemented by all storage backends
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Whether an object exists under `key`
    async fn exists(&self, key: &str) -> BlobResult<bool>;

    /// Get blob metadata without content
    async fn head(&self, key: &str) -> BlobResult<ObjectHead>;

    /// Read the inclusive byte offsets `start..=end` of a blob
    async fn read_range(&self, key: &str, start: u64, end: u64) -> BlobResult<ByteStream>;

    /// List up to `limit` objects under `prefix`
    async fn list(&self, prefix: &str, limit: usize) -> BlobResult<Vec<BlobInfo>>;
}

/// Metadata about a blob as reported by the backend
#[derive(Debug, Clone, Default)]
pub struct ObjectHead {
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Listing entry
#[derive(Debug, Clone)]
pub struct BlobInfo {
    pub key: String,
    pub size_bytes: u64,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Strategy for mapping request paths to storage keys
pub trait BlobKeyStrategy: Send + Sync {
    /// Storage key for a request path
    fn object_key(&self, path: &str) -> String;

    /// Prefix under which all served objects live
    fn prefix(&self) -> &str;
}

/// Fixed prefix joined with the request path: `demo/v3/` + `tour/intro.mp4`
#[derive(Debug, Clone)]
pub struct PrefixKeyStrategy {
    prefix: String,
}

impl PrefixKeyStrategy {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl BlobKeyStrategy for PrefixKeyStrategy {
    fn object_key(&self, path: &str) -> String {
        format!("{}{}", self.prefix, path)
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Run a backend call with an upper bound; an elapsed bound becomes `BlobError::Timeout`.
pub(crate) async fn within<T, F>(limit: Duration, key: &str, call: F) -> BlobResult<T>
where
    F: Future<Output = BlobResult<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| BlobError::timeout(key, limit))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_key_strategy_joins_path() {
        let keys = PrefixKeyStrategy::new("demo/v3/");
        assert_eq!(keys.object_key("tour/intro.mp4"), "demo/v3/tour/intro.mp4");
        assert_eq!(keys.object_key(""), "demo/v3/");
        assert_eq!(keys.prefix(), "demo/v3/");
    }
}
