//! Pipeline trigger endpoint

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::AppState;

/// Query parameters for a manual analysis run
#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    /// Analysis date (YYYY-MM-DD); defaults to the current UTC date
    pub date: Option<NaiveDate>,
}

/// Error response
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Run the snapshot pipeline once and return the run summary
///
/// Individual market failures are reported inside the summary; only a run
/// where no market could be fetched at all maps to an error status.
async fn analyze(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeQuery>,
) -> impl IntoResponse {
    let target_date = params.date.unwrap_or_else(|| Utc::now().date_naive());
    info!("Manual analysis run requested for {}", target_date);

    let market_ids: Vec<String> = match state.store.list_markets() {
        Ok(markets) => markets.into_iter().map(|m| m.id).collect(),
        Err(e) => {
            error!("Could not list markets: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!(ErrorResponse {
                    error: "market registry unavailable".to_string(),
                })),
            );
        }
    };

    match state
        .orchestrator
        .run_snapshot(target_date, &market_ids)
        .await
    {
        Ok(summary) => match serde_json::to_value(&summary) {
            Ok(body) => (StatusCode::OK, Json(body)),
            Err(e) => {
                error!("Could not serialize run summary: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!(ErrorResponse {
                        error: "summary serialization failed".to_string(),
                    })),
                )
            }
        },
        Err(e) => {
            error!("Analysis run for {} failed: {}", target_date, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!(ErrorResponse {
                    error: e.to_string(),
                })),
            )
        }
    }
}

/// Create process routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/process/analyze", post(analyze))
}
