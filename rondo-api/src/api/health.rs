//! Health endpoint (no authentication)

use axum::Json;
use rondo_common::api::types::HealthResponse;

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "rondo-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
