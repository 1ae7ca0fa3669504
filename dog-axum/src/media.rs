//! Range-aware media handler for `GET|HEAD /{*path}`.
//!
//! Per request: resolve the storage key, load metadata through the cache,
//! answer `If-None-Match` with 304 before any byte is read, resolve the
//! `Range` header, read exactly that window, then pick 200 or 206.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{
    ACCEPT_RANGES, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG,
    IF_NONE_MATCH, LAST_MODIFIED, RANGE, X_CONTENT_TYPE_OPTIONS,
};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use dog_blob::{BlobError, ObjectMetadata, ResolvedRange};
use dog_core::errors::DogError;
use tracing::{debug, warn};

use crate::{DogAxumError, ProxyState};

pub const CACHE_POLICY: &str = "public, max-age=3600, immutable";

static X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

pub async fn serve(
    State(state): State<ProxyState>,
    method: Method,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, DogAxumError> {
    let blobs = &state.blobs;
    let key = blobs.storage_key(&path);

    // Backend failures while resolving metadata are reported as 404.
    let meta = blobs
        .metadata(&key)
        .await
        .map_err(|err| {
            DogError::not_found(format!("Video not found: {path}")).with_source(err)
        })?;

    if etag_matches(&headers, &meta) {
        debug!(key = %key, "etag matched, 304");
        let mut out = HeaderMap::new();
        validator_headers(&mut out, &meta);
        return Ok((StatusCode::NOT_MODIFIED, out).into_response());
    }

    let range_header = headers.get(RANGE);
    let range_value = range_header.and_then(|v| v.to_str().ok());

    let mut out = HeaderMap::new();
    content_headers(&mut out, &meta);

    let Some(range) = blobs.resolve_range(range_value, meta.size) else {
        // Empty object: nothing to read.
        out.insert(CONTENT_LENGTH, HeaderValue::from(0u64));
        return Ok((StatusCode::OK, out, Body::empty()).into_response());
    };

    let partial = range_header.is_some() && !range.is_full_content();
    let status = if partial {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    out.insert(CONTENT_LENGTH, HeaderValue::from(range.content_length()));
    if partial {
        insert_str(&mut out, CONTENT_RANGE, &range.content_range());
    }

    debug!(
        key = %key,
        status = status.as_u16(),
        start = range.start,
        end = range.end,
        size = meta.size,
        "serving window"
    );

    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        read_body(&state, &key, &range).await?
    };

    Ok((status, out, body).into_response())
}

async fn read_body(
    state: &ProxyState,
    key: &str,
    range: &ResolvedRange,
) -> Result<Body, DogAxumError> {
    let blobs = &state.blobs;
    let failed =
        |err: BlobError| DogError::general_error("Failed to read video chunk").with_source(err);

    if blobs.should_stream(range) {
        let stream = blobs.open_chunk(key, range).await.map_err(failed)?;
        Ok(Body::from_stream(stream))
    } else {
        let chunk = blobs.read_chunk(key, range).await.map_err(failed)?;
        Ok(Body::from(chunk))
    }
}

/// Byte-exact comparison; weak validators and lists are not interpreted.
fn etag_matches(headers: &HeaderMap, meta: &ObjectMetadata) -> bool {
    headers
        .get(IF_NONE_MATCH)
        .is_some_and(|v| v.as_bytes() == meta.etag.as_bytes())
}

fn validator_headers(out: &mut HeaderMap, meta: &ObjectMetadata) {
    insert_str(out, ETAG, &meta.etag);
    out.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_POLICY));
    if let Some(last_modified) = meta.http_last_modified() {
        insert_str(out, LAST_MODIFIED, &last_modified);
    }
}

fn content_headers(out: &mut HeaderMap, meta: &ObjectMetadata) {
    validator_headers(out, meta);
    insert_str(out, CONTENT_TYPE, &meta.content_type);
    out.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    out.insert(X_ACCEL_BUFFERING.clone(), HeaderValue::from_static("no"));
    out.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
}

// Backend-supplied values may not be valid header text; skip rather than fail.
fn insert_str(out: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            out.insert(name, value);
        }
        Err(_) => warn!(header = %name, value, "dropping invalid header value"),
    }
}
