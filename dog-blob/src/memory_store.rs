use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use crate::store::{BlobInfo, BlobStore, ObjectHead};
use crate::{BlobError, BlobResult, ByteStream};

/// Size of the pieces a ranged read is split into.
const STREAM_PIECE: usize = 64 * 1024;

/// An object held by [`MemoryBlobStore`]
#[derive(Debug, Clone)]
pub struct MemoryObject {
    pub data: Bytes,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: DateTime<Utc>,
}

impl MemoryObject {
    pub fn new<B: Into<Bytes>>(data: B) -> Self {
        Self {
            data: data.into(),
            content_type: None,
            etag: None,
            last_modified: Utc::now(),
        }
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_etag<S: Into<String>>(mut self, etag: S) -> Self {
        self.etag = Some(etag.into());
        self
    }

    pub fn with_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = at;
        self
    }
}

#[derive(Debug, Default)]
struct CallCounters {
    exists: AtomicUsize,
    head: AtomicUsize,
    read: AtomicUsize,
    list: AtomicUsize,
}

#[derive(Debug, Default)]
struct Faults {
    metadata: AtomicBool,
    reads: AtomicBool,
    lists: AtomicBool,
    short_reads: AtomicBool,
    delay: Mutex<Option<Duration>>,
    key_delays: Mutex<HashMap<String, Duration>>,
}

/// In-process store with call counters and fault injection.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, MemoryObject>>,
    calls: CallCounters,
    faults: Faults,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: Into<String>>(&self, key: K, object: MemoryObject) {
        self.objects.write().insert(key.into(), object);
    }

    pub fn exists_calls(&self) -> usize {
        self.calls.exists.load(Ordering::SeqCst)
    }

    pub fn head_calls(&self) -> usize {
        self.calls.head.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> usize {
        self.calls.read.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.calls.list.load(Ordering::SeqCst)
    }

    /// Make `exists`/`head` fail with a backend error
    pub fn fail_metadata(&self, fail: bool) {
        self.faults.metadata.store(fail, Ordering::SeqCst);
    }

    /// Make `read_range` fail with a backend error
    pub fn fail_reads(&self, fail: bool) {
        self.faults.reads.store(fail, Ordering::SeqCst);
    }

    /// Make `list` fail with a backend error
    pub fn fail_lists(&self, fail: bool) {
        self.faults.lists.store(fail, Ordering::SeqCst);
    }

    /// Drop the last byte of every ranged read
    pub fn short_reads(&self, short: bool) {
        self.faults.short_reads.store(short, Ordering::SeqCst);
    }

    /// Sleep this long before answering any call
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.faults.delay.lock() = delay;
    }

    /// Sleep this long before answering calls for `key` only
    pub fn delay_key<K: Into<String>>(&self, key: K, delay: Duration) {
        self.faults.key_delays.lock().insert(key.into(), delay);
    }

    async fn pause(&self, key: &str) {
        let global = *self.faults.delay.lock();
        let keyed = self.faults.key_delays.lock().get(key).copied();
        for delay in [global, keyed].into_iter().flatten() {
            tokio::time::sleep(delay).await;
        }
    }

    fn injected(what: &str) -> BlobError {
        BlobError::backend(std::io::Error::other(format!("injected {what} failure")))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn exists(&self, key: &str) -> BlobResult<bool> {
        self.calls.exists.fetch_add(1, Ordering::SeqCst);
        self.pause(key).await;
        if self.faults.metadata.load(Ordering::SeqCst) {
            return Err(Self::injected("exists"));
        }
        Ok(self.objects.read().contains_key(key))
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        self.calls.head.fetch_add(1, Ordering::SeqCst);
        self.pause(key).await;
        if self.faults.metadata.load(Ordering::SeqCst) {
            return Err(Self::injected("head"));
        }

        let objects = self.objects.read();
        let object = objects.get(key).ok_or_else(|| BlobError::not_found(key))?;
        Ok(ObjectHead {
            size_bytes: object.data.len() as u64,
            content_type: object.content_type.clone(),
            etag: object.etag.clone(),
            last_modified: Some(object.last_modified),
        })
    }

    async fn read_range(&self, key: &str, start: u64, end: u64) -> BlobResult<ByteStream> {
        self.calls.read.fetch_add(1, Ordering::SeqCst);
        self.pause(key).await;
        if self.faults.reads.load(Ordering::SeqCst) {
            return Err(Self::injected("read"));
        }

        let data = {
            let objects = self.objects.read();
            let object = objects.get(key).ok_or_else(|| BlobError::not_found(key))?;
            object.data.clone()
        };

        let len = data.len() as u64;
        if start > end || start >= len {
            return Err(BlobError::invalid(format!(
                "range {start}-{end} not satisfiable for {len} bytes"
            )));
        }

        let mut stop = end.min(len - 1) as usize + 1;
        if self.faults.short_reads.load(Ordering::SeqCst) {
            stop -= 1;
        }
        let window = data.slice(start as usize..stop);

        let pieces: Vec<Result<Bytes, std::io::Error>> = window
            .chunks(STREAM_PIECE)
            .map(|piece| Ok(window.slice_ref(piece)))
            .collect();
        Ok(Box::pin(futures_util::stream::iter(pieces)))
    }

    async fn list(&self, prefix: &str, limit: usize) -> BlobResult<Vec<BlobInfo>> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        self.pause(prefix).await;
        if self.faults.lists.load(Ordering::SeqCst) {
            return Err(Self::injected("list"));
        }

        let objects = self.objects.read();
        let mut keys: Vec<&String> = objects.keys().filter(|k| k.starts_with(prefix)).collect();
        keys.sort();

        Ok(keys
            .into_iter()
            .take(limit)
            .map(|key| {
                let object = &objects[key];
                BlobInfo {
                    key: key.clone(),
                    size_bytes: object.data.len() as u64,
                    etag: object.etag.clone(),
                    last_modified: Some(object.last_modified),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    async fn collect(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(piece) = stream.next().await {
            out.extend_from_slice(&piece.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn read_range_is_inclusive() {
        let store = MemoryBlobStore::new();
        store.insert("k", MemoryObject::new((0u8..=255).collect::<Vec<u8>>()));

        let bytes = collect(store.read_range("k", 10, 19).await.unwrap()).await;
        assert_eq!(bytes, (10u8..=19).collect::<Vec<u8>>());
        assert_eq!(store.read_calls(), 1);
    }

    #[tokio::test]
    async fn large_reads_arrive_in_pieces() {
        let store = MemoryBlobStore::new();
        store.insert("k", MemoryObject::new(vec![7u8; 200_000]));

        let mut stream = store.read_range("k", 0, 199_999).await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.len(), STREAM_PIECE);
        let rest = collect(stream).await;
        assert_eq!(first.len() + rest.len(), 200_000);
    }

    #[tokio::test]
    async fn unsatisfiable_range_is_rejected() {
        let store = MemoryBlobStore::new();
        store.insert("k", MemoryObject::new(vec![0u8; 10]));

        assert!(matches!(
            store.read_range("k", 10, 12).await,
            Err(BlobError::Invalid { .. })
        ));
        assert!(matches!(
            store.read_range("missing", 0, 1).await,
            Err(BlobError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn list_honors_prefix_and_limit() {
        let store = MemoryBlobStore::new();
        store.insert("demo/v3/a.mp4", MemoryObject::new(vec![1u8]));
        store.insert("demo/v3/b.mp4", MemoryObject::new(vec![1u8]));
        store.insert("other/c.mp4", MemoryObject::new(vec![1u8]));

        let listed = store.list("demo/v3/", 1).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "demo/v3/a.mp4");
    }
}
