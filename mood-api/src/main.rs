//! Global Market Mood API Server
//!
//! HTTP server exposing the snapshot pipeline: a manual analysis trigger
//! and read endpoints over the persisted daily states and correlations.

mod routes;

use axum::{
    http::{header, Method},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mood_ingest::{
    IngestService, IngestServiceConfig, MarketDataProvider, SyntheticProvider, YahooProvider,
};
use mood_services::{
    seed_default_markets, OrchestratorConfig, Scheduler, SchedulerConfig, SnapshotOrchestrator,
    SnapshotStore,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SnapshotStore>,
    pub orchestrator: Arc<SnapshotOrchestrator>,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,mood_api=debug")),
        )
        .init();

    info!("Starting Global Market Mood API");

    // Initialize the snapshot store (SQLite database)
    let db_path = std::env::var("MOOD_DB_PATH").unwrap_or_else(|_| "data/mood.db".to_string());
    info!("Initializing snapshot store at: {}", db_path);
    let store = Arc::new(SnapshotStore::new(&db_path)?);

    let seeded = seed_default_markets(&store)?;
    if seeded > 0 {
        info!("Registered {} default markets", seeded);
    }

    // Select the market data provider. Synthetic mode keeps the whole
    // pipeline runnable offline.
    let use_synthetic = std::env::var("MOOD_USE_SYNTHETIC")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let provider: Arc<dyn MarketDataProvider> = if use_synthetic {
        info!("Using synthetic market data (MOOD_USE_SYNTHETIC set)");
        Arc::new(SyntheticProvider::new())
    } else {
        Arc::new(YahooProvider::new()?)
    };

    let mut ingest_config = IngestServiceConfig::default();
    if let Some(secs) = env_parse::<u64>("MOOD_FETCH_TIMEOUT_SECS") {
        ingest_config.fetch_timeout = Duration::from_secs(secs);
    }
    let ingest = Arc::new(IngestService::new(provider, ingest_config));

    let mut orchestrator_config = OrchestratorConfig::default();
    if let Some(n) = env_parse::<usize>("MOOD_FETCH_CONCURRENCY") {
        orchestrator_config.fetch_concurrency = n;
    }
    let orchestrator = Arc::new(SnapshotOrchestrator::new(
        ingest,
        Arc::clone(&store),
        orchestrator_config,
    ));

    // Start the recurring analysis and retention loops in the background
    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&orchestrator),
        Arc::clone(&store),
        SchedulerConfig::default(),
    ));
    tokio::spawn(async move {
        scheduler.start().await;
    });

    let state = AppState {
        store,
        orchestrator,
    };

    // Configure CORS for frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    // Build router
    let app = Router::new()
        .nest("/api", routes::api_routes())
        .merge(routes::health_routes())
        .layer(cors)
        .with_state(state);

    // Start server
    let port = env_parse::<u16>("SERVER_PORT").unwrap_or(8000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
