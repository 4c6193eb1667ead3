//! Background scheduler
//!
//! Runs the snapshot pipeline on a fixed cadence and prunes aged rows on a
//! slower one. Both loops run indefinitely once started; a failed cycle is
//! logged and the loop waits for the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::orchestrator::SnapshotOrchestrator;
use crate::snapshot_store::SnapshotStore;

/// Configuration for the background scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often to run the snapshot pipeline (in seconds)
    pub analysis_interval_secs: u64,
    /// How often to prune aged rows (in seconds)
    pub cleanup_interval_secs: u64,
    /// Rows older than this many days are pruned
    pub retention_days: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            analysis_interval_secs: 24 * 60 * 60,
            cleanup_interval_secs: 7 * 24 * 60 * 60,
            retention_days: 90,
        }
    }
}

/// Background service driving recurring snapshot runs and retention
pub struct Scheduler {
    orchestrator: Arc<SnapshotOrchestrator>,
    store: Arc<SnapshotStore>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        orchestrator: Arc<SnapshotOrchestrator>,
        store: Arc<SnapshotStore>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            orchestrator,
            store,
            config,
        }
    }

    /// Start both recurring loops
    ///
    /// The cleanup loop is spawned onto the runtime; the analysis loop runs
    /// on the calling task. Neither returns. The first tick of each interval
    /// fires immediately, so startup produces a snapshot for today.
    pub async fn start(self: Arc<Self>) {
        info!(
            "Starting scheduler: analysis every {}s, cleanup every {}s, {} day retention",
            self.config.analysis_interval_secs,
            self.config.cleanup_interval_secs,
            self.config.retention_days
        );

        let cleanup = Arc::clone(&self);
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(cleanup.config.cleanup_interval_secs));
            loop {
                ticker.tick().await;
                cleanup.cleanup_cycle();
            }
        });

        let mut ticker = interval(Duration::from_secs(self.config.analysis_interval_secs));
        loop {
            ticker.tick().await;
            self.analysis_cycle().await;
        }
    }

    /// One analysis cycle over every registered market
    pub async fn analysis_cycle(&self) {
        let today = Utc::now().date_naive();

        let market_ids: Vec<String> = match self.store.list_markets() {
            Ok(markets) => markets.into_iter().map(|m| m.id).collect(),
            Err(e) => {
                error!("Could not list markets for scheduled run: {}", e);
                return;
            }
        };

        if market_ids.is_empty() {
            warn!("Market registry is empty, skipping scheduled run");
            return;
        }

        match self.orchestrator.run_snapshot(today, &market_ids).await {
            Ok(summary) => {
                info!(
                    "Scheduled run for {} finished: {}/{} markets ok in {:?}",
                    today,
                    summary.ok_count(),
                    summary.outcomes.len(),
                    summary.duration
                );
            }
            Err(e) => {
                error!("Scheduled run for {} failed: {}", today, e);
            }
        }
    }

    /// One retention cycle
    pub fn cleanup_cycle(&self) {
        let cutoff = Utc::now().date_naive() - ChronoDuration::days(self.config.retention_days);
        match self.store.prune_before(cutoff) {
            Ok(removed) if removed > 0 => {
                info!("Pruned {} daily rows older than {}", removed, cutoff);
            }
            Ok(_) => {}
            Err(e) => {
                error!("Retention pruning failed: {}", e);
            }
        }
    }
}
