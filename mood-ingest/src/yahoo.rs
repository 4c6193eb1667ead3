//! Yahoo Finance chart API client
//!
//! Live implementation of [`MarketDataProvider`] over the public v8 chart
//! endpoint. Internal market ids are normalized to provider tickers before
//! the request; rows with missing closes are dropped rather than invented.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use mood_core::{MoodError, MoodResult, RawSeriesPoint};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::provider::MarketDataProvider;
use crate::symbols::provider_symbol;

/// Base URL for the Yahoo chart API
const YAHOO_API_BASE: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo chart API client
#[derive(Clone)]
pub struct YahooProvider {
    client: Client,
    base_url: String,
}

impl YahooProvider {
    /// Create a new provider against the public API
    pub fn new() -> MoodResult<Self> {
        Self::with_base_url(YAHOO_API_BASE)
    }

    /// Create a provider against a custom base URL (used by tests)
    pub fn with_base_url(base_url: impl Into<String>) -> MoodResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("mood-pipeline/0.1")
            .build()
            .map_err(|e| MoodError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn epoch_seconds(date: NaiveDate) -> i64 {
        date.and_time(NaiveTime::MIN).and_utc().timestamp()
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    #[instrument(skip(self))]
    async fn fetch_series(
        &self,
        market_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> MoodResult<Vec<RawSeriesPoint>> {
        let symbol = provider_symbol(market_id)
            .ok_or_else(|| MoodError::provider(market_id, "no provider symbol mapping"))?;

        // period2 is exclusive on the provider side; push it one day past
        // the requested end so the end date itself is included.
        let period1 = Self::epoch_seconds(start);
        let period2 = Self::epoch_seconds(end.succ_opt().unwrap_or(end));

        let url = format!(
            "{}/{}?period1={}&period2={}&interval=1d",
            self.base_url, symbol, period1, period2
        );

        debug!("Fetching chart for {} ({}) from: {}", market_id, symbol, url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            MoodError::provider(market_id, format!("Failed to fetch chart: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MoodError::provider(
                market_id,
                format!("Chart API error ({}): {}", status, body),
            ));
        }

        let chart: ChartResponse = response.json().await.map_err(|e| {
            MoodError::provider(market_id, format!("Failed to parse chart response: {}", e))
        })?;

        if let Some(error) = chart.chart.error {
            return Err(MoodError::provider(
                market_id,
                format!("Chart API error: {}", error.description),
            ));
        }

        let result = chart
            .chart
            .result
            .and_then(|mut r| (!r.is_empty()).then(|| r.remove(0)))
            .ok_or_else(|| MoodError::provider(market_id, "empty chart result"))?;

        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| MoodError::provider(market_id, "chart result without quotes"))?;

        let mut points = Vec::with_capacity(result.timestamp.len());
        for (i, ts) in result.timestamp.iter().enumerate() {
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Half-holidays and stale rows come back as nulls; skip them.
            let (Some(close), Some(date)) = (
                close.filter(|c| *c > 0.0),
                DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()),
            ) else {
                continue;
            };

            points.push(RawSeriesPoint::new(date, close, volume.unwrap_or(0.0)));
        }

        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);

        debug!("Got {} usable points for {}", points.len(), market_id);
        Ok(points)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}
