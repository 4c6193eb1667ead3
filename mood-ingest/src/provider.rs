//! Provider capability trait and the ingestion service
//!
//! `MarketDataProvider` is the single seam to the outside world: the live
//! HTTP client and the synthetic generator both implement it, selected by
//! configuration. `IngestService` wraps a primary provider with a
//! per-market timeout and the automatic synthetic fallback.

use async_trait::async_trait;
use chrono::NaiveDate;
use mood_core::{MoodError, MoodResult, RawSeriesPoint};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::synthetic::SyntheticProvider;

/// Capability interface to a market-data source
///
/// Implementations return the ordered-by-date daily series for one market
/// over a date range, or a provider error. No other part of the pipeline
/// talks to the outside world.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Provider name for logging and run summaries
    fn name(&self) -> &'static str;

    /// Fetch the (date, close, volume) series for `market_id`, ordered by
    /// date ascending, covering `[start, end]`
    async fn fetch_series(
        &self,
        market_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> MoodResult<Vec<RawSeriesPoint>>;
}

/// A fetched series plus where it came from
#[derive(Debug, Clone)]
pub struct FetchedSeries {
    pub points: Vec<RawSeriesPoint>,
    /// True when the synthetic fallback supplied the series
    pub synthetic: bool,
}

/// Configuration for the ingestion service
#[derive(Debug, Clone)]
pub struct IngestServiceConfig {
    /// Per-market provider call timeout; a timeout counts as a fetch failure
    pub fetch_timeout: Duration,
    /// Whether to fall back to the synthetic generator on provider failure
    pub synthetic_fallback: bool,
}

impl Default for IngestServiceConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(20),
            synthetic_fallback: true,
        }
    }
}

/// Ingestion boundary used by the orchestrator
///
/// Applies the per-market timeout to the primary provider and, when
/// configured, retries a failed fetch against the synthetic generator.
pub struct IngestService {
    primary: Arc<dyn MarketDataProvider>,
    fallback: Option<SyntheticProvider>,
    config: IngestServiceConfig,
}

impl IngestService {
    pub fn new(primary: Arc<dyn MarketDataProvider>, config: IngestServiceConfig) -> Self {
        let fallback = config.synthetic_fallback.then(SyntheticProvider::new);
        Self {
            primary,
            fallback,
            config,
        }
    }

    /// Fetch one market's series, falling back to synthetic data when the
    /// primary provider fails or times out
    pub async fn fetch(
        &self,
        market_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> MoodResult<FetchedSeries> {
        let primary = tokio::time::timeout(
            self.config.fetch_timeout,
            self.primary.fetch_series(market_id, start, end),
        )
        .await
        .unwrap_or_else(|_| {
            Err(MoodError::provider(
                market_id,
                format!(
                    "{} timed out after {:?}",
                    self.primary.name(),
                    self.config.fetch_timeout
                ),
            ))
        });

        match primary {
            Ok(points) => {
                debug!(
                    "Fetched {} points for {} from {}",
                    points.len(),
                    market_id,
                    self.primary.name()
                );
                Ok(FetchedSeries {
                    points,
                    synthetic: false,
                })
            }
            Err(e) => {
                let Some(fallback) = &self.fallback else {
                    return Err(e);
                };
                warn!(
                    "Provider {} failed for {} ({}), using synthetic fallback",
                    self.primary.name(),
                    market_id,
                    e
                );
                let points = fallback.fetch_series(market_id, start, end).await?;
                Ok(FetchedSeries {
                    points,
                    synthetic: true,
                })
            }
        }
    }
}
