use std::sync::Arc;

use bytes::Bytes;
use tracing::{error, warn};

use crate::store::within;
use crate::{
    BlobConfig, BlobInfo, BlobKeyStrategy, BlobResult, BlobStore, ByteStream, ChunkStreamer,
    MetadataCache, ObjectMetadata, PrefixKeyStrategy, RangeParser, ResolvedRange,
};

/// The main blob adapter - what the HTTP layer embeds.
///
/// Owns the store and everything layered on it, so each server
/// instance (and each test) gets its own metadata cache.
pub struct BlobAdapter {
    store: Arc<dyn BlobStore>,
    keys: Arc<dyn BlobKeyStrategy>,
    cache: MetadataCache,
    ranges: RangeParser,
    streamer: ChunkStreamer,
    config: BlobConfig,
}

impl BlobAdapter {
    /// Create a new blob adapter keyed by `config.key_prefix`
    pub fn new<S: BlobStore + 'static>(store: S, config: BlobConfig) -> Self {
        Self::from_arc(Arc::new(store), config)
    }

    /// Create from a shared store (tests keep a handle to inspect it)
    pub fn from_arc(store: Arc<dyn BlobStore>, config: BlobConfig) -> Self {
        let keys = PrefixKeyStrategy::new(config.key_prefix.clone());
        Self::with_key_strategy(store, keys, config)
    }

    /// Create with custom key strategy
    pub fn with_key_strategy<K: BlobKeyStrategy + 'static>(
        store: Arc<dyn BlobStore>,
        keys: K,
        config: BlobConfig,
    ) -> Self {
        Self {
            cache: MetadataCache::new(Arc::clone(&store), &config),
            streamer: ChunkStreamer::new(Arc::clone(&store), &config),
            ranges: RangeParser::new(config.chunk_size),
            keys: Arc::new(keys),
            store,
            config,
        }
    }

    /// Storage key for a request path
    pub fn storage_key(&self, path: &str) -> String {
        self.keys.object_key(path)
    }

    pub fn prefix(&self) -> &str {
        self.keys.prefix()
    }

    /// Cached metadata for `key`
    pub async fn metadata(&self, key: &str) -> BlobResult<Arc<ObjectMetadata>> {
        self.cache.get(key).await.inspect_err(|err| {
            if err.is_not_found() {
                warn!(key, "object not found");
            } else {
                error!(key, error = %err, "metadata lookup failed");
            }
        })
    }

    /// Byte window for a `Range` header; `None` for empty objects
    pub fn resolve_range(&self, header: Option<&str>, total_size: u64) -> Option<ResolvedRange> {
        self.ranges.resolve(header, total_size)
    }

    /// Read a window into memory
    pub async fn read_chunk(&self, key: &str, range: &ResolvedRange) -> BlobResult<Bytes> {
        self.streamer.read(key, range).await.inspect_err(|err| {
            error!(key, start = range.start, end = range.end, error = %err, "chunk read failed");
        })
    }

    /// Open a window as a lazy stream
    pub async fn open_chunk(&self, key: &str, range: &ResolvedRange) -> BlobResult<ByteStream> {
        self.streamer.open(key, range).await.inspect_err(|err| {
            error!(key, start = range.start, end = range.end, error = %err, "chunk stream failed");
        })
    }

    /// Whether a window should be streamed rather than buffered
    pub fn should_stream(&self, range: &ResolvedRange) -> bool {
        range.content_length() > self.config.max_buffered_bytes
    }

    /// Backend connectivity check: list at most one object under the prefix
    pub async fn check_connectivity(&self) -> BlobResult<Vec<BlobInfo>> {
        let prefix = self.keys.prefix();
        within(self.config.backend_timeout, prefix, self.store.list(prefix, 1))
            .await
            .inspect_err(|err| error!(prefix, error = %err, "health check failed"))
    }

    /// Drop cached metadata for `key`
    pub fn invalidate(&self, key: &str) {
        self.cache.invalidate(key);
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Get configuration
    pub fn config(&self) -> &BlobConfig {
        &self.config
    }
}
