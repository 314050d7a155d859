//! Health check handlers.

use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Root endpoint.
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Clip Scene API is running" }))
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
