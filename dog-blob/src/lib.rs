//! # dog-blob: range-friendly blob reads
//!
//! `dog-blob` serves byte windows of large objects (video, audio) out of
//! object storage. It knows nothing about HTTP: callers hand it a request
//! path and an optional `Range` header value, and get back metadata, a
//! resolved byte window and the bytes for that window.
//!
//! ## Key Features
//!
//! - **Range resolution**: `bytes=N-M`, `bytes=N-` and `bytes=-M`, clamped to the object size;
//!   malformed input falls back to a default window instead of failing
//! - **Metadata cache**: size, content type, ETag and last-modified kept for a TTL in a bounded LRU
//! - **Exact reads**: one ranged backend call per request, length-checked
//! - **Storage agnostic**: S3-compatible backends via the AWS SDK, native GCS via opendal,
//!   plus an in-memory store for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dog_blob::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let store = dog_blob::S3CompatibleStore::from_env().await?;
//! let adapter = BlobAdapter::new(store, BlobConfig::default());
//!
//! let key = adapter.storage_key("tour/intro.mp4");
//! let meta = adapter.metadata(&key).await?;
//! if let Some(range) = adapter.resolve_range(Some("bytes=0-"), meta.size) {
//!     let chunk = adapter.read_chunk(&key, &range).await?;
//!     assert_eq!(chunk.len() as u64, range.content_length());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   HTTP handler  │  ← status codes, headers
//! ├─────────────────┤
//! │   BlobAdapter   │  ← keys, cache, ranges, chunk reads
//! ├─────────────────┤
//! │   BlobStore     │  ← storage primitives
//! └─────────────────┘
//! ```

pub mod adapter;
mod cache;
mod config;
mod error;
mod gcs_store;
mod memory_store;
pub mod range;
mod s3_store;
pub mod store;
mod streamer;
mod types;

// Re-export main types for clean API
pub use adapter::BlobAdapter;
pub use cache::MetadataCache;
pub use config::{
    BlobConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_CHUNK_SIZE, DEFAULT_CONTENT_TYPE,
    DEFAULT_KEY_PREFIX, DEFAULT_METADATA_TTL,
};
pub use error::{BlobError, BlobResult};
pub use gcs_store::{GcsConfig, GcsStore};
pub use memory_store::{MemoryBlobStore, MemoryObject};
pub use range::{RangeParser, RangeSpec, ResolvedRange};
pub use s3_store::{S3CompatibleStore, S3Config};
pub use store::{BlobInfo, BlobKeyStrategy, BlobStore, ObjectHead, PrefixKeyStrategy};
pub use streamer::ChunkStreamer;
pub use types::{synthesize_etag, ByteStream, ObjectMetadata};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobAdapter, BlobConfig, BlobError, BlobResult, BlobStore, ByteStream, ObjectMetadata,
        ResolvedRange,
    };
}
