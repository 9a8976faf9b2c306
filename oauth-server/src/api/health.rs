use axum::{response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

/// Liveness check, served next to the OAuth routes by the binary
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
