/// Liveness and health endpoints
///
/// ```text
/// GET /        -> "Task management server is running"
/// GET /health  -> { "status": "healthy", "version": "0.1.0", "store": "postgres", "store_status": "connected" }
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Plain liveness message
pub const LIVENESS_MESSAGE: &str = "Task management server is running";

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,

    /// Application version
    pub version: String,

    /// Store backend name
    pub store: String,

    /// "connected" or "disconnected"
    pub store_status: String,
}

/// Liveness handler
pub async fn liveness() -> &'static str {
    LIVENESS_MESSAGE
}

/// Health check handler
///
/// Always answers 200; a failing store ping reports `degraded`.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = state.bounded("ping", state.store.ping()).await.is_ok();

    Json(HealthResponse {
        status: (if connected { "healthy" } else { "degraded" }).to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: state.store.name().to_string(),
        store_status: (if connected { "connected" } else { "disconnected" }).to_string(),
    })
}
