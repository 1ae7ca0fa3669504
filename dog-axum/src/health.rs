use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::ProxyState;

/// `GET /health`: lists at most one object under the key prefix.
pub async fn health(State(state): State<ProxyState>) -> Response {
    match state.blobs.check_connectivity().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "bucket": state.info.bucket,
                "service": state.info.service,
                "timestamp": chrono::Utc::now().timestamp(),
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "error": err.to_string(),
            })),
        )
            .into_response(),
    }
}

/// `GET /`: static service descriptor.
pub async fn index(State(state): State<ProxyState>) -> Json<Value> {
    Json(json!({
        "service": state.info.name,
        "version": state.info.version,
        "features": state.info.features,
    }))
}
