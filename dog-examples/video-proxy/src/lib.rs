pub mod config;

use anyhow::Result;
use dog_axum::{axum, AxumApp, ProxyState, ServiceInfo};
use dog_blob::{BlobAdapter, BlobStore, GcsConfig, GcsStore, S3CompatibleStore, S3Config};

pub use config::{ProxySettings, StorageBackend};

/// Wire the configured object store into the axum app.
pub async fn build(settings: &ProxySettings) -> Result<AxumApp> {
    let bucket = settings.bucket.clone();
    let lookup = |key: &str| match key {
        "S3_BUCKET" | "GCS_BUCKET" => Some(bucket.clone()),
        other => std::env::var(other).ok(),
    };

    tracing::info!(
        backend = ?settings.backend,
        bucket = %settings.bucket,
        prefix = %settings.blob.key_prefix,
        "connecting to object storage"
    );

    let app = match settings.backend {
        StorageBackend::Gcs => {
            let gcs = GcsConfig::from_lookup(lookup)?;
            with_store(GcsStore::new(gcs)?, settings)
        }
        StorageBackend::S3 => {
            let s3 = S3Config::from_lookup(lookup)?;
            tracing::info!(
                region = %s3.region,
                endpoint = s3.endpoint_url.as_deref().unwrap_or("aws"),
                "using S3-compatible backend"
            );
            with_store(S3CompatibleStore::new(s3).await, settings)
        }
    };
    Ok(app)
}

/// Same app over any store; the tests run it against memory.
pub fn with_store<S: BlobStore + 'static>(store: S, settings: &ProxySettings) -> AxumApp {
    let blobs = BlobAdapter::new(store, settings.blob.clone());
    let info = ServiceInfo::new(settings.bucket.clone()).with_version(env!("CARGO_PKG_VERSION"));
    axum(ProxyState::new(blobs, info))
}
