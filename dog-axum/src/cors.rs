//! CORS header contract for media responses and preflights.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE,
};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, HEAD, OPTIONS";
pub const ALLOW_HEADERS: &str = "Range, If-None-Match";
pub const EXPOSE_HEADERS: &str = "Content-Range, Accept-Ranges, Content-Length";
pub const MAX_AGE: &str = "3600";

/// Add the CORS headers a response does not set itself.
pub fn apply(headers: &mut HeaderMap) {
    for (name, value) in [
        (ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN),
        (ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS),
        (ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
        (ACCESS_CONTROL_EXPOSE_HEADERS, EXPOSE_HEADERS),
    ] {
        headers
            .entry(name)
            .or_insert(HeaderValue::from_static(value));
    }
}

/// Response mapper installed on the whole router.
pub async fn add_cors_headers(mut response: Response) -> Response {
    apply(response.headers_mut());
    response
}

/// `OPTIONS /{*path}`: 204, no body.
pub async fn preflight() -> Response {
    let mut headers = HeaderMap::new();
    apply(&mut headers);
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE));
    (StatusCode::NO_CONTENT, headers).into_response()
}
