use std::sync::Arc;

use dog_blob::BlobAdapter;
use serde::Serialize;

/// Shared state handed to every handler.
///
/// Cheap to clone; the adapter (and its metadata cache) is shared.
#[derive(Clone)]
pub struct ProxyState {
    pub blobs: Arc<BlobAdapter>,
    pub info: Arc<ServiceInfo>,
}

impl ProxyState {
    pub fn new(blobs: BlobAdapter, info: ServiceInfo) -> Self {
        Self {
            blobs: Arc::new(blobs),
            info: Arc::new(info),
        }
    }
}

/// What `GET /` and `GET /health` report about this deployment
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    /// Human-readable name
    pub name: String,
    /// Short identifier reported by the health check
    pub service: String,
    pub version: String,
    pub bucket: String,
    pub features: Vec<String>,
}

impl ServiceInfo {
    pub fn new<S: Into<String>>(bucket: S) -> Self {
        Self {
            name: "DogRS Video Proxy".to_string(),
            service: "video-proxy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            bucket: bucket.into(),
            features: [
                "HTTP Range Request Support",
                "4K Video Streaming",
                "S3-Compatible Backend",
                "Metadata Caching",
                "CORS Support",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_version<S: Into<String>>(mut self, version: S) -> Self {
        self.version = version.into();
        self
    }
}
