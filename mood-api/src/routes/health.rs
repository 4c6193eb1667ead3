//! Health check endpoints

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    registered_markets: usize,
}

/// Health check handler: verifies the store answers queries
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.store.list_markets() {
        Ok(markets) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                registered_markets: markets.len(),
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "degraded".to_string(),
                registered_markets: 0,
            }),
        ),
    }
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}
