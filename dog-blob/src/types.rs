use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Stream of bytes for blob content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Snapshot of an object's metadata as served to clients.
///
/// Produced by the metadata cache and replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub size: u64,
    pub content_type: String,
    pub etag: String,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectMetadata {
    pub fn new<C: Into<String>, E: Into<String>>(size: u64, content_type: C, etag: E) -> Self {
        Self {
            size,
            content_type: content_type.into(),
            etag: etag.into(),
            last_modified: None,
        }
    }

    pub fn with_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }

    /// `Last-Modified` rendered as an IMF-fixdate.
    pub fn http_last_modified(&self) -> Option<String> {
        self.last_modified
            .map(|at| at.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
    }
}

/// Validator for backends that report no ETag: size and mtime in hex, quoted.
pub fn synthesize_etag(size: u64, last_modified: Option<DateTime<Utc>>) -> String {
    let mtime = last_modified.map(|at| at.timestamp()).unwrap_or_default();
    format!("\"{:x}-{:x}\"", size, mtime)
}
