//! API route definitions

mod data;
mod health;
mod process;

use crate::AppState;
use axum::Router;

/// Create all /api routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(data::routes())
        .merge(process::routes())
}

/// Create root-level health routes
pub fn health_routes() -> Router<AppState> {
    health::routes()
}
