use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tracing::debug;

use crate::store::{within, BlobStore};
use crate::{BlobConfig, BlobError, BlobResult, ByteStream, ResolvedRange};

/// Reads exactly one resolved byte window from the backend.
pub struct ChunkStreamer {
    store: Arc<dyn BlobStore>,
    timeout: Duration,
}

impl ChunkStreamer {
    pub fn new(store: Arc<dyn BlobStore>, config: &BlobConfig) -> Self {
        Self {
            store,
            timeout: config.backend_timeout,
        }
    }

    /// Buffer the whole window. The result is exactly `range.content_length()`
    /// bytes long or the call fails with `BlobError::ShortRead`.
    pub async fn read(&self, key: &str, range: &ResolvedRange) -> BlobResult<Bytes> {
        let expected = range.content_length();
        debug!(key, start = range.start, end = range.end, "reading chunk");

        let read = async {
            let mut stream = self.store.read_range(key, range.start, range.end).await?;
            let mut buf = BytesMut::with_capacity(expected as usize);
            while let Some(piece) = stream.next().await {
                buf.extend_from_slice(&piece?);
                if buf.len() as u64 > expected {
                    break;
                }
            }
            Ok::<_, BlobError>(buf.freeze())
        };

        let body = within(self.timeout, key, read).await?;
        let actual = body.len() as u64;
        if actual != expected {
            return Err(BlobError::ShortRead {
                key: key.to_string(),
                expected,
                actual,
            });
        }
        Ok(body)
    }

    /// Open the window as a lazy stream. Only opening the read is bounded by
    /// the backend timeout; a stream that ends early or runs long yields an
    /// I/O error instead of silently truncating the body.
    pub async fn open(&self, key: &str, range: &ResolvedRange) -> BlobResult<ByteStream> {
        let expected = range.content_length();
        debug!(key, start = range.start, end = range.end, "streaming chunk");

        let mut inner = within(
            self.timeout,
            key,
            self.store.read_range(key, range.start, range.end),
        )
        .await?;

        let key = key.to_string();
        let stream = async_stream::stream! {
            let mut sent: u64 = 0;
            let mut failed = false;
            while let Some(piece) = inner.next().await {
                let piece = match piece {
                    Ok(piece) => piece,
                    Err(err) => {
                        failed = true;
                        yield Err(err);
                        break;
                    }
                };
                sent += piece.len() as u64;
                if sent > expected {
                    failed = true;
                    let msg = format!("{key}: backend sent more than {expected} bytes");
                    yield Err(std::io::Error::other(msg));
                    break;
                }
                yield Ok(piece);
            }
            if !failed && sent != expected {
                let msg = format!("{key}: backend sent {sent} of {expected} bytes");
                yield Err(std::io::Error::other(msg));
            }
        };

        Ok(Box::pin(stream))
    }
}
