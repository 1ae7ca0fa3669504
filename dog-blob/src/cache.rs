//! Time-bounded LRU cache of object metadata.
//!
//! Lookups hold the lock only long enough to read or write an entry.
//! Backend calls happen with the lock released, so a slow `head` for one
//! key never stalls requests for another. Concurrent misses for the same
//! key may each fetch; the last writer wins and entries are always
//! replaced whole.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::store::{within, BlobStore};
use crate::types::synthesize_etag;
use crate::{BlobConfig, BlobError, BlobResult, ObjectMetadata};

struct CacheEntry {
    metadata: Arc<ObjectMetadata>,
    fetched_at: Instant,
}

pub struct MetadataCache {
    store: Arc<dyn BlobStore>,
    entries: Mutex<LruCache<String, CacheEntry>>,
    misses: Mutex<LruCache<String, Instant>>,
    ttl: Duration,
    negative_ttl: Option<Duration>,
    timeout: Duration,
    default_content_type: String,
}

fn capacity(entries: usize) -> NonZeroUsize {
    NonZeroUsize::new(entries).unwrap_or(NonZeroUsize::MIN)
}

impl MetadataCache {
    pub fn new(store: Arc<dyn BlobStore>, config: &BlobConfig) -> Self {
        Self {
            store,
            entries: Mutex::new(LruCache::new(capacity(config.cache_capacity))),
            misses: Mutex::new(LruCache::new(capacity(config.cache_capacity))),
            ttl: config.metadata_ttl,
            negative_ttl: config.negative_ttl,
            timeout: config.backend_timeout,
            default_content_type: config.default_content_type.clone(),
        }
    }

    /// Metadata for `key`, loading it from the backend on a miss or after expiry.
    ///
    /// Absent objects yield `BlobError::NotFound`; backend failures and
    /// timeouts are returned as-is and never cached.
    pub async fn get(&self, key: &str) -> BlobResult<Arc<ObjectMetadata>> {
        if let Some(metadata) = self.lookup(key) {
            debug!(key, "metadata cache hit");
            return Ok(metadata);
        }

        if self.recently_missing(key) {
            debug!(key, "negative cache hit");
            return Err(BlobError::not_found(key));
        }

        debug!(key, "metadata cache miss");
        match self.fetch(key).await {
            Ok(metadata) => {
                let metadata = Arc::new(metadata);
                self.entries.lock().put(
                    key.to_string(),
                    CacheEntry {
                        metadata: Arc::clone(&metadata),
                        fetched_at: Instant::now(),
                    },
                );
                Ok(metadata)
            }
            Err(err) => {
                if err.is_not_found() && self.negative_ttl.is_some() {
                    self.misses.lock().put(key.to_string(), Instant::now());
                }
                Err(err)
            }
        }
    }

    /// Drop any cached state for `key`.
    pub fn invalidate(&self, key: &str) {
        self.entries.lock().pop(key);
        self.misses.lock().pop(key);
    }

    /// Number of cached (possibly stale) entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Option<Arc<ObjectMetadata>> {
        let mut entries = self.entries.lock();
        let cached = entries
            .get(key)
            .map(|entry| (entry.fetched_at.elapsed() < self.ttl, Arc::clone(&entry.metadata)));

        match cached {
            Some((true, metadata)) => Some(metadata),
            Some((false, _)) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    fn recently_missing(&self, key: &str) -> bool {
        let Some(ttl) = self.negative_ttl else {
            return false;
        };

        let mut misses = self.misses.lock();
        match misses.get(key).map(|at| at.elapsed() < ttl) {
            Some(true) => true,
            Some(false) => {
                misses.pop(key);
                false
            }
            None => false,
        }
    }

    async fn fetch(&self, key: &str) -> BlobResult<ObjectMetadata> {
        if !within(self.timeout, key, self.store.exists(key)).await? {
            return Err(BlobError::not_found(key));
        }

        let head = within(self.timeout, key, self.store.head(key)).await?;

        let content_type = head
            .content_type
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or_else(|| self.default_content_type.clone());
        let etag = head
            .etag
            .filter(|etag| !etag.is_empty())
            .unwrap_or_else(|| synthesize_etag(head.size_bytes, head.last_modified));

        Ok(ObjectMetadata {
            size: head.size_bytes,
            content_type,
            etag,
            last_modified: head.last_modified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryBlobStore, MemoryObject};

    const KEY: &str = "demo/v3/intro.mp4";

    fn setup(config: BlobConfig) -> (Arc<MemoryBlobStore>, MetadataCache) {
        let store = Arc::new(MemoryBlobStore::new());
        store.insert(
            KEY,
            MemoryObject::new(vec![0u8; 500])
                .with_content_type("video/webm")
                .with_etag("\"abc\""),
        );
        let cache = MetadataCache::new(store.clone(), &config);
        (store, cache)
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_lookups_within_ttl_hit_the_cache() {
        let (store, cache) = setup(BlobConfig::default());

        let first = cache.get(KEY).await.unwrap();
        let second = cache.get(KEY).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.size, 500);
        assert_eq!(first.content_type, "video/webm");
        assert_eq!(first.etag, "\"abc\"");
        assert_eq!(store.head_calls(), 1);
        assert_eq!(store.exists_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_refetched() {
        let (store, cache) = setup(BlobConfig::default());

        cache.get(KEY).await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        cache.get(KEY).await.unwrap();
        assert_eq!(store.head_calls(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        cache.get(KEY).await.unwrap();
        assert_eq!(store.head_calls(), 2);
    }

    #[tokio::test]
    async fn missing_objects_are_not_cached() {
        let (store, cache) = setup(BlobConfig::default());

        for _ in 0..3 {
            let err = cache.get("demo/v3/missing.mp4").await.unwrap_err();
            assert!(err.is_not_found());
        }

        assert_eq!(store.exists_calls(), 3);
        assert_eq!(store.head_calls(), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn negative_ttl_caches_misses_briefly() {
        let config = BlobConfig::default().with_negative_ttl(Duration::from_secs(5));
        let (store, cache) = setup(config);

        assert!(cache.get("demo/v3/missing.mp4").await.unwrap_err().is_not_found());
        assert!(cache.get("demo/v3/missing.mp4").await.unwrap_err().is_not_found());
        assert_eq!(store.exists_calls(), 1);

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(cache.get("demo/v3/missing.mp4").await.unwrap_err().is_not_found());
        assert_eq!(store.exists_calls(), 2);
    }

    #[tokio::test]
    async fn backend_errors_propagate_and_are_not_cached() {
        let (store, cache) = setup(BlobConfig::default());
        store.fail_metadata(true);

        assert!(matches!(cache.get(KEY).await, Err(BlobError::Backend { .. })));
        assert!(cache.is_empty());

        store.fail_metadata(false);
        assert!(cache.get(KEY).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out() {
        let config = BlobConfig::default().with_backend_timeout(Duration::from_secs(1));
        let (store, cache) = setup(config);
        store.set_delay(Some(Duration::from_secs(60)));

        assert!(matches!(cache.get(KEY).await, Err(BlobError::Timeout { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn slow_backend_call_does_not_block_other_keys() {
        const SLOW: &str = "demo/v3/slow.mp4";

        let (store, cache) = setup(BlobConfig::default());
        store.insert(SLOW, MemoryObject::new(vec![0u8; 10]));
        store.delay_key(SLOW, Duration::from_secs(10));
        let cache = Arc::new(cache);

        let slow = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.get(SLOW).await }
        });
        while store.exists_calls() == 0 {
            tokio::task::yield_now().await;
        }

        let started = std::time::Instant::now();
        let fast = tokio::time::timeout(Duration::from_secs(2), cache.get(KEY)).await;

        assert_eq!(fast.unwrap().unwrap().size, 500);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!slow.is_finished());
        slow.abort();
    }

    #[tokio::test]
    async fn missing_content_type_and_etag_get_defaults() {
        let store = Arc::new(MemoryBlobStore::new());
        store.insert("bare", MemoryObject::new(vec![1u8; 16]));
        let cache = MetadataCache::new(store, &BlobConfig::default());

        let meta = cache.get("bare").await.unwrap();
        assert_eq!(meta.content_type, "video/mp4");
        assert!(meta.etag.starts_with("\"10-"));
    }

    #[tokio::test]
    async fn least_recently_used_entry_is_evicted() {
        let store = Arc::new(MemoryBlobStore::new());
        for key in ["a", "b", "c"] {
            store.insert(key, MemoryObject::new(vec![1u8]).with_etag(key));
        }
        let config = BlobConfig::default().with_cache_capacity(2);
        let cache = MetadataCache::new(store.clone(), &config);

        cache.get("a").await.unwrap();
        cache.get("b").await.unwrap();
        cache.get("a").await.unwrap();
        cache.get("c").await.unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(store.head_calls(), 3);

        cache.get("a").await.unwrap();
        assert_eq!(store.head_calls(), 3);
        cache.get("b").await.unwrap();
        assert_eq!(store.head_calls(), 4);
    }

    #[tokio::test]
    async fn invalidate_forces_a_reload() {
        let (store, cache) = setup(BlobConfig::default());

        cache.get(KEY).await.unwrap();
        cache.invalidate(KEY);
        cache.get(KEY).await.unwrap();
        assert_eq!(store.head_calls(), 2);
    }
}
