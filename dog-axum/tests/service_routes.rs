use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use dog_axum::{axum, AxumApp, ProxyState, ServiceInfo};
use dog_blob::{BlobAdapter, BlobConfig, MemoryBlobStore, MemoryObject};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

fn app() -> (Arc<MemoryBlobStore>, AxumApp) {
    let store = Arc::new(MemoryBlobStore::new());
    store.insert("demo/v3/a.mp4", MemoryObject::new(vec![0u8; 4]));

    let blobs = BlobAdapter::from_arc(store.clone(), BlobConfig::default());
    let info = ServiceInfo::new("propmatch_frontend")
        .with_name("Test Video Proxy")
        .with_version("9.9.9");
    (store, axum(ProxyState::new(blobs, info)))
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_ok_reports_bucket_and_service() {
    let (store, ax) = app();

    let res = ax
        .router
        .oneshot(Request::builder().method("GET").uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["bucket"], "propmatch_frontend");
    assert_eq!(body["service"], "video-proxy");
    assert!(body["timestamp"].as_i64().unwrap() > 0);
    assert_eq!(store.list_calls(), 1);
}

#[tokio::test]
async fn health_failure_is_503_with_error() {
    let (store, ax) = app();
    store.fail_lists(true);

    let res = ax
        .router
        .oneshot(Request::builder().method("GET").uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 503);
    let body = json_body(res).await;
    assert_eq!(body["status"], "unhealthy");
    assert!(body["error"].as_str().unwrap().contains("injected list failure"));
}

#[tokio::test]
async fn index_describes_the_service() {
    let (_, ax) = app();

    let res = ax
        .router
        .oneshot(Request::builder().method("GET").uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    assert_eq!(body["service"], "Test Video Proxy");
    assert_eq!(body["version"], "9.9.9");
    assert!(body["features"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f == "HTTP Range Request Support"));
}

#[tokio::test]
async fn request_id_is_preserved_when_provided() {
    let (_, ax) = app();

    let provided = HeaderValue::from_static("req-test-123");
    let res = ax
        .router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/a.mp4")
                .header("x-request-id", provided.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
}
