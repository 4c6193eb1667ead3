//! Read endpoints over the persisted snapshot data

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use mood_core::{DailyState, MarketDescriptor};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::AppState;

/// Error response
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Response for listing registered markets
#[derive(Debug, Serialize)]
struct MarketsResponse {
    markets: Vec<MarketDescriptor>,
    count: usize,
}

/// Query parameters for market history
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of daily rows, newest first
    pub days: Option<usize>,
}

/// Response for one market's history
#[derive(Debug, Serialize)]
struct HistoryResponse {
    market_id: String,
    history: Vec<DailyState>,
}

fn store_error(e: impl std::fmt::Display) -> (StatusCode, Json<serde_json::Value>) {
    error!("Store query failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!(ErrorResponse {
            error: "snapshot store unavailable".to_string(),
        })),
    )
}

/// Latest persisted snapshot: all markets plus correlations for the most
/// recent analysis date
async fn latest_snapshot(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.latest_snapshot() {
        Ok(Some(snapshot)) => (StatusCode::OK, Json(serde_json::json!(snapshot))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!(ErrorResponse {
                error: "no snapshot available yet".to_string(),
            })),
        ),
        Err(e) => store_error(e),
    }
}

/// List the registered markets
async fn list_markets(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list_markets() {
        Ok(markets) => {
            let count = markets.len();
            (
                StatusCode::OK,
                Json(serde_json::json!(MarketsResponse { markets, count })),
            )
        }
        Err(e) => store_error(e),
    }
}

/// Recent daily rows for one market, newest first
async fn market_history(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> impl IntoResponse {
    match state.store.get_market(&market_id) {
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!(ErrorResponse {
                    error: format!("unknown market: {}", market_id),
                })),
            )
        }
        Err(e) => return store_error(e),
        Ok(Some(_)) => {}
    }

    let limit = params.days.unwrap_or(30);
    match state.store.market_history(&market_id, limit) {
        Ok(history) => (
            StatusCode::OK,
            Json(serde_json::json!(HistoryResponse { market_id, history })),
        ),
        Err(e) => store_error(e),
    }
}

/// Create data routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/data/latest", get(latest_snapshot))
        .route("/data/markets", get(list_markets))
        .route("/history/{market_id}", get(market_history))
}
