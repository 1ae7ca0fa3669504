use std::time::Duration;

/// Default window served when a request carries no usable range (1 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// How long a cached metadata entry stays fresh.
pub const DEFAULT_METADATA_TTL: Duration = Duration::from_secs(5 * 60);

/// Distinct keys kept in the metadata cache before LRU eviction.
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Prefix joined with the request path to form the storage key.
pub const DEFAULT_KEY_PREFIX: &str = "demo/v3/";

pub const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

/// Configuration for range reads and metadata caching
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Size of the window served for absent, malformed or open-ended ranges
    pub chunk_size: u64,

    /// Freshness window of a cached metadata entry
    pub metadata_ttl: Duration,

    /// Maximum number of distinct keys in the metadata cache
    pub cache_capacity: usize,

    /// When set, NotFound results are cached for this long.
    /// Off by default: every miss re-checks the backend.
    pub negative_ttl: Option<Duration>,

    /// Upper bound on any single backend call
    pub backend_timeout: Duration,

    /// Windows up to this size are buffered and length-checked before the
    /// response starts; larger explicit ranges are streamed.
    pub max_buffered_bytes: u64,

    /// Content type used when the backend reports none
    pub default_content_type: String,

    /// Fixed prefix for storage keys
    pub key_prefix: String,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            metadata_ttl: DEFAULT_METADATA_TTL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            negative_ttl: None,
            backend_timeout: Duration::from_secs(30),
            max_buffered_bytes: 8 * DEFAULT_CHUNK_SIZE, // 8MB
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl BlobConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default chunk size (minimum 1 byte)
    pub fn with_chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size = bytes.max(1);
        self
    }

    pub fn with_metadata_ttl(mut self, ttl: Duration) -> Self {
        self.metadata_ttl = ttl;
        self
    }

    /// Set cache capacity (minimum 1 entry)
    pub fn with_cache_capacity(mut self, entries: usize) -> Self {
        self.cache_capacity = entries.max(1);
        self
    }

    /// Enable short-lived caching of NotFound results
    pub fn with_negative_ttl(mut self, ttl: Duration) -> Self {
        self.negative_ttl = Some(ttl);
        self
    }

    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }

    pub fn with_max_buffered_bytes(mut self, bytes: u64) -> Self {
        self.max_buffered_bytes = bytes;
        self
    }

    pub fn with_default_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.default_content_type = content_type.into();
        self
    }

    pub fn with_key_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}
