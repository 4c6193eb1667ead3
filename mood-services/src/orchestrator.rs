//! Snapshot Orchestrator
//!
//! Drives one end-to-end analysis run: fan out the per-market series
//! fetches, compute features and mood per market in isolation, aggregate
//! the correlation matrix over the survivors, and persist everything for
//! the target date as one transactional batch. This is the only component
//! with side effects; per-market failures are folded into the run summary
//! and never abort the run on their own.

use chrono::{Duration as ChronoDuration, NaiveDate};
use futures::stream::{self, StreamExt};
use mood_analytics::{CorrelationCalculator, FeatureCalculator, MoodEngine};
use mood_core::{
    DailyState, MarketOutcome, MoodError, MoodResult, RawSeriesPoint, RunSummary,
};
use mood_ingest::IngestService;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Calendar days of history to request per market; must cover the
    /// 30-trading-day volatility window with weekends and holidays on top
    pub fetch_days: i64,
    /// Bounded fan-out width for provider fetches
    pub fetch_concurrency: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fetch_days: 45,
            fetch_concurrency: 8,
        }
    }
}

/// Orchestrates one full analysis cycle per call
pub struct SnapshotOrchestrator {
    ingest: Arc<IngestService>,
    store: Arc<crate::snapshot_store::SnapshotStore>,
    config: OrchestratorConfig,
}

impl SnapshotOrchestrator {
    pub fn new(
        ingest: Arc<IngestService>,
        store: Arc<crate::snapshot_store::SnapshotStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            ingest,
            store,
            config,
        }
    }

    /// Run one snapshot for `target_date` over the given markets
    ///
    /// The target date is an explicit parameter so runs stay deterministic
    /// and testable; callers resolve "today" themselves. Nothing is written
    /// until the very end, so a caller that drops this future before
    /// persistence leaves the store untouched. Re-running the same date is
    /// always safe and is the documented recovery for a partial prior run.
    #[instrument(skip(self, market_ids), fields(markets = market_ids.len()))]
    pub async fn run_snapshot(
        &self,
        target_date: NaiveDate,
        market_ids: &[String],
    ) -> MoodResult<RunSummary> {
        let started = Instant::now();
        let fetch_start = target_date - ChronoDuration::days(self.config.fetch_days);

        info!(
            "Starting snapshot run for {} over {} markets",
            target_date,
            market_ids.len()
        );

        // Stage 1: bounded parallel fetch. Markets share no mutable state
        // here; results are collected into an indexed map first and only
        // aggregated afterwards.
        let ingest = &self.ingest;
        let fetched: Vec<(String, MoodResult<mood_ingest::FetchedSeries>)> =
            stream::iter(market_ids.iter().cloned())
                .map(|id| async move {
                    let result = ingest.fetch(&id, fetch_start, target_date).await;
                    (id, result)
                })
                .buffer_unordered(self.config.fetch_concurrency.max(1))
                .collect()
                .await;
        let mut fetched: HashMap<String, MoodResult<mood_ingest::FetchedSeries>> =
            fetched.into_iter().collect();

        // Stage 2: per-market features and mood, failures isolated.
        let mut outcomes: Vec<(String, MarketOutcome)> = Vec::with_capacity(market_ids.len());
        let mut states: Vec<DailyState> = Vec::new();
        let mut returns_by_market: BTreeMap<String, Vec<(NaiveDate, f64)>> = BTreeMap::new();
        let mut fetch_ok = 0usize;

        for id in market_ids {
            let outcome = match fetched.remove(id) {
                None => MarketOutcome::FetchFailed {
                    reason: "fetch result missing".to_string(),
                },
                Some(Err(e)) => {
                    warn!("Fetch failed for {}: {}", id, e);
                    MarketOutcome::FetchFailed {
                        reason: e.to_string(),
                    }
                }
                Some(Ok(series)) => {
                    fetch_ok += 1;
                    match Self::analyze_market(id, target_date, &series.points) {
                        None => MarketOutcome::InsufficientData,
                        Some((state, mood_computed)) => {
                            returns_by_market
                                .insert(id.clone(), FeatureCalculator::daily_returns(&series.points));
                            states.push(state);
                            if mood_computed {
                                MarketOutcome::Ok {
                                    synthetic: series.synthetic,
                                }
                            } else {
                                // A short series still yields a row, with
                                // null mood rather than a fabricated value.
                                MarketOutcome::InsufficientData
                            }
                        }
                    }
                }
            };
            outcomes.push((id.clone(), outcome));
        }

        if fetch_ok == 0 {
            return Err(MoodError::provider(
                "all markets",
                "no market data source reachable",
            ));
        }

        // Stage 3: correlation over the survivors, single-threaded, from
        // the series already indexed by market.
        let edges = CorrelationCalculator::pairwise(target_date, &returns_by_market);

        // Stage 4: one transactional batch; a store failure is fatal for
        // the run.
        self.store
            .persist_snapshot(&states, &edges)
            .map_err(|e| MoodError::store(e.to_string()))?;

        let summary = RunSummary {
            target_date,
            markets_written: states.len(),
            correlation_pairs_written: edges.len(),
            outcomes,
            duration: started.elapsed(),
        };

        info!(
            "Snapshot run complete for {}: {} markets written, {} correlation pairs, {} fetch failures",
            target_date,
            summary.markets_written,
            summary.correlation_pairs_written,
            summary.failed_count()
        );

        Ok(summary)
    }

    /// Compute one market's DailyState; `None` when the series is empty
    ///
    /// The second element reports whether a full mood index was computable
    /// (false means the row carries nulls and the market counts as
    /// insufficient-data in the summary).
    fn analyze_market(
        market_id: &str,
        target_date: NaiveDate,
        points: &[RawSeriesPoint],
    ) -> Option<(DailyState, bool)> {
        let features = FeatureCalculator::latest_features(market_id, points).ok()?;
        let (mood_index, mood_level) = MoodEngine::mood(&features);
        let last = points.last()?;

        let state = DailyState {
            market_id: market_id.to_string(),
            date: target_date,
            close_price: last.close,
            volume: last.volume,
            change_pct: features.daily_return.map(|r| r * 100.0),
            mood_index,
            mood_level,
            volatility: features.volatility,
            trend_strength: features.trend_strength,
            created_at: None,
            updated_at: None,
        };

        Some((state, mood_index.is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot_store::SnapshotStore;
    use async_trait::async_trait;
    use mood_core::DailyState;
    use mood_ingest::{
        IngestServiceConfig, MarketDataProvider, SyntheticProvider,
    };
    use std::collections::HashSet;

    /// Provider that serves synthetic data for an allow-list of markets
    /// and fails for everything else
    struct PartialProvider {
        reachable: HashSet<String>,
        inner: SyntheticProvider,
    }

    impl PartialProvider {
        fn new(reachable: &[&str]) -> Self {
            Self {
                reachable: reachable.iter().map(|s| s.to_string()).collect(),
                inner: SyntheticProvider::new(),
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for PartialProvider {
        fn name(&self) -> &'static str {
            "partial"
        }

        async fn fetch_series(
            &self,
            market_id: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> MoodResult<Vec<RawSeriesPoint>> {
            if self.reachable.contains(market_id) {
                self.inner.fetch_series(market_id, start, end).await
            } else {
                Err(MoodError::provider(market_id, "unreachable"))
            }
        }
    }

    /// Provider that serves a fixed two-point series for every market
    struct ShortHistoryProvider;

    #[async_trait]
    impl MarketDataProvider for ShortHistoryProvider {
        fn name(&self) -> &'static str {
            "short"
        }

        async fn fetch_series(
            &self,
            _market_id: &str,
            _start: NaiveDate,
            end: NaiveDate,
        ) -> MoodResult<Vec<RawSeriesPoint>> {
            Ok(vec![
                RawSeriesPoint::new(end.pred_opt().unwrap(), 100.0, 1000.0),
                RawSeriesPoint::new(end, 101.0, 1000.0),
            ])
        }
    }

    fn orchestrator(
        provider: Arc<dyn MarketDataProvider>,
        fallback: bool,
    ) -> (SnapshotOrchestrator, Arc<SnapshotStore>) {
        let store = Arc::new(SnapshotStore::new_in_memory().unwrap());
        let ingest = Arc::new(IngestService::new(
            provider,
            IngestServiceConfig {
                synthetic_fallback: fallback,
                ..Default::default()
            },
        ));
        (
            SnapshotOrchestrator::new(
                Arc::clone(&ingest),
                Arc::clone(&store),
                OrchestratorConfig::default(),
            ),
            store,
        )
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn target() -> NaiveDate {
        "2026-08-28".parse().unwrap()
    }

    fn strip_timestamps(mut state: DailyState) -> DailyState {
        state.created_at = None;
        state.updated_at = None;
        state
    }

    #[tokio::test]
    async fn test_full_run_writes_states_and_edges() {
        let (orchestrator, store) =
            orchestrator(Arc::new(SyntheticProvider::new()), false);
        let markets = ids(&["EU_STOXX", "JP_NIKKEI", "US_SPX"]);

        let summary = orchestrator.run_snapshot(target(), &markets).await.unwrap();

        assert_eq!(summary.ok_count(), 3);
        assert_eq!(summary.markets_written, 3);
        // 45 calendar days of synthetic weekday data easily clears the
        // 5-point alignment floor for every pair
        assert_eq!(summary.correlation_pairs_written, 3);

        let snapshot = store.latest_snapshot().unwrap().unwrap();
        assert_eq!(snapshot.date, target());
        assert_eq!(snapshot.markets.len(), 3);
        assert_eq!(snapshot.correlations.len(), 3);
        for edge in &snapshot.correlations {
            assert!(edge.source_id < edge.target_id);
            assert!(edge.value >= -1.0 && edge.value <= 1.0);
        }
        for state in &snapshot.markets {
            let index = state.mood_index.unwrap();
            assert!((-1.0..=1.0).contains(&index));
            assert!(state.mood_level.is_some());
        }
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let (orchestrator, store) =
            orchestrator(Arc::new(SyntheticProvider::new()), false);
        let markets = ids(&["EU_STOXX", "US_SPX"]);

        orchestrator.run_snapshot(target(), &markets).await.unwrap();
        let first_states: Vec<DailyState> = store
            .daily_states_for_date(target())
            .unwrap()
            .into_iter()
            .map(strip_timestamps)
            .collect();
        let first_edges = store.edges_for_date(target()).unwrap();

        orchestrator.run_snapshot(target(), &markets).await.unwrap();
        let second_states: Vec<DailyState> = store
            .daily_states_for_date(target())
            .unwrap()
            .into_iter()
            .map(strip_timestamps)
            .collect();
        let second_edges = store.edges_for_date(target()).unwrap();

        assert_eq!(first_states, second_states);
        assert_eq!(first_edges, second_edges);
    }

    #[tokio::test]
    async fn test_single_reachable_market_still_succeeds() {
        let provider = Arc::new(PartialProvider::new(&["US_SPX"]));
        let (orchestrator, store) = orchestrator(provider, false);
        let markets = ids(&["CN_SSE", "EU_STOXX", "US_SPX"]);

        let summary = orchestrator.run_snapshot(target(), &markets).await.unwrap();

        assert_eq!(summary.ok_count(), 1);
        assert_eq!(summary.failed_count(), 2);
        assert_eq!(summary.markets_written, 1);
        // One surviving market cannot form a pair
        assert_eq!(summary.correlation_pairs_written, 0);

        let snapshot = store.latest_snapshot().unwrap().unwrap();
        assert_eq!(snapshot.markets.len(), 1);
        assert_eq!(snapshot.markets[0].market_id, "US_SPX");
        assert!(snapshot.correlations.is_empty());
    }

    #[tokio::test]
    async fn test_no_reachable_market_fails_the_run() {
        let provider = Arc::new(PartialProvider::new(&[]));
        let (orchestrator, store) = orchestrator(provider, false);
        let markets = ids(&["EU_STOXX", "US_SPX"]);

        let err = orchestrator
            .run_snapshot(target(), &markets)
            .await
            .unwrap_err();
        assert!(matches!(err, MoodError::Provider { .. }));

        // A wholly failed run writes nothing
        assert!(store.latest_snapshot().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_markets_fall_back_to_synthetic() {
        let provider = Arc::new(PartialProvider::new(&["US_SPX"]));
        let (orchestrator, _store) = orchestrator(provider, true);
        let markets = ids(&["EU_STOXX", "US_SPX"]);

        let summary = orchestrator.run_snapshot(target(), &markets).await.unwrap();

        assert_eq!(summary.ok_count(), 2);
        let by_id: HashMap<_, _> = summary.outcomes.iter().cloned().collect();
        assert_eq!(by_id["US_SPX"], MarketOutcome::Ok { synthetic: false });
        assert_eq!(by_id["EU_STOXX"], MarketOutcome::Ok { synthetic: true });
    }

    #[tokio::test]
    async fn test_short_history_is_insufficient_data_not_failure() {
        let (orchestrator, store) = orchestrator(Arc::new(ShortHistoryProvider), false);
        let markets = ids(&["US_SPX"]);

        let summary = orchestrator.run_snapshot(target(), &markets).await.unwrap();

        assert_eq!(summary.outcomes[0].1, MarketOutcome::InsufficientData);
        // The row is still produced, with null volatility and null mood
        assert_eq!(summary.markets_written, 1);
        let row = store.get_daily_state("US_SPX", target()).unwrap().unwrap();
        assert!(row.change_pct.is_some());
        assert_eq!(row.volatility, None);
        assert_eq!(row.mood_index, None);
        assert_eq!(row.mood_level, None);
    }

    #[tokio::test]
    async fn test_outcomes_follow_configured_market_order() {
        let (orchestrator, _store) =
            orchestrator(Arc::new(SyntheticProvider::new()), false);
        let markets = ids(&["US_SPX", "EU_STOXX", "JP_NIKKEI"]);

        let summary = orchestrator.run_snapshot(target(), &markets).await.unwrap();
        let order: Vec<&str> = summary.outcomes.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, vec!["US_SPX", "EU_STOXX", "JP_NIKKEI"]);
    }
}
