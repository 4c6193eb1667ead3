//! Deterministic synthetic series generator
//!
//! Stand-in for the live provider in environments without network access
//! and the automatic fallback when a provider call fails. Generation is
//! seeded from (market id, date range), so repeated runs for the same
//! request produce byte-identical series and the snapshot pipeline stays
//! idempotent even on fallback data.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use mood_core::{MoodResult, RawSeriesPoint};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::provider::MarketDataProvider;

/// Reference level each market's walk starts from
const BASE_PRICES: &[(&str, f64)] = &[
    ("US_SPX", 4500.0),
    ("US_IYY", 38500.0),
    ("US_CCMP", 14200.0),
    ("EU_STOXX", 4300.0),
    ("GB_FTSE", 7700.0),
    ("JP_NIKKEI", 32500.0),
    ("CN_SSE", 3200.0),
    ("IN_SENSEX", 72000.0),
    ("BR_IBOV", 130000.0),
    ("KR_KOSPI", 2650.0),
    ("RU_MOEX", 3000.0),
    ("AU_ASX", 7400.0),
    ("CH_SMI", 11200.0),
    ("SG_STI", 3350.0),
    ("MX_MEXBOL", 21000.0),
];

/// Fallback base level for ids outside the reference table
const DEFAULT_BASE_PRICE: f64 = 1000.0;

/// Maximum daily fractional move of the random walk
const MAX_DAILY_CHANGE: f64 = 0.02;

/// Daily volume bounds
const MIN_VOLUME: f64 = 1_000_000.0;
const MAX_VOLUME: f64 = 10_000_000.0;

/// Deterministic synthetic market-data provider
#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn new() -> Self {
        Self
    }

    fn base_price(market_id: &str) -> f64 {
        BASE_PRICES
            .iter()
            .find(|(id, _)| *id == market_id)
            .map(|(_, p)| *p)
            .unwrap_or(DEFAULT_BASE_PRICE)
    }

    fn seed(market_id: &str, start: NaiveDate, end: NaiveDate) -> u64 {
        let mut hasher = DefaultHasher::new();
        market_id.hash(&mut hasher);
        start.hash(&mut hasher);
        end.hash(&mut hasher);
        hasher.finish()
    }
}

#[async_trait]
impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    /// Generate a weekday-only random walk over `[start, end]`
    async fn fetch_series(
        &self,
        market_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> MoodResult<Vec<RawSeriesPoint>> {
        let mut rng = StdRng::seed_from_u64(Self::seed(market_id, start, end));
        let mut price = Self::base_price(market_id);
        let mut points = Vec::new();

        let mut date = start;
        while date <= end {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                let change: f64 = rng.random_range(-MAX_DAILY_CHANGE..MAX_DAILY_CHANGE);
                price *= 1.0 + change;
                let volume: f64 = rng.random_range(MIN_VOLUME..MAX_VOLUME).round();
                points.push(RawSeriesPoint::new(date, price, volume));
            }
            let Some(next) = date.succ_opt() else {
                break;
            };
            date = next;
        }

        Ok(points)
    }
}
