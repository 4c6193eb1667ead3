//! Feature Calculator
//!
//! Turns an ordered raw price/volume series for one market into the derived
//! features for its most recent date: daily return, trailing realized
//! volatility, trend strength, and volume ratio. Features whose trailing
//! window is too short come back as `None` rather than a fabricated zero.

use chrono::NaiveDate;
use mood_core::{DailyFeatureSet, MoodError, MoodResult, RawSeriesPoint};

/// Trailing window (in returns) for realized volatility
pub const VOLATILITY_WINDOW: usize = 30;

/// Trailing window (in returns) for trend strength
pub const TREND_WINDOW: usize = 10;

/// Trailing window (in days) for the volume ratio denominator
pub const VOLUME_WINDOW: usize = 10;

/// Sample standard deviation is undefined below this many returns
const MIN_RETURNS_FOR_VOLATILITY: usize = 2;

/// Pure per-market feature computation
pub struct FeatureCalculator;

impl FeatureCalculator {
    /// Consecutive fractional daily returns of a close series
    ///
    /// The series must be ordered by date. The first point has no prior
    /// close and produces no return; pairs with a non-positive prior close
    /// are skipped.
    pub fn daily_returns(series: &[RawSeriesPoint]) -> Vec<(NaiveDate, f64)> {
        series
            .windows(2)
            .filter(|w| w[0].close > 0.0)
            .map(|w| (w[1].date, (w[1].close - w[0].close) / w[0].close))
            .collect()
    }

    /// Compute the feature set for the most recent date of `series`
    ///
    /// Fails with `InsufficientData` only when the series is empty; a short
    /// series degrades to partial features with `None` fields so that
    /// newly-listed or sparsely-covered markets still flow through the
    /// pipeline.
    pub fn latest_features(
        market_id: &str,
        series: &[RawSeriesPoint],
    ) -> MoodResult<DailyFeatureSet> {
        let last = series
            .last()
            .ok_or_else(|| MoodError::insufficient_data(market_id))?;

        let returns: Vec<f64> = Self::daily_returns(series)
            .into_iter()
            .map(|(_, r)| r)
            .collect();

        let daily_return = returns.last().copied();

        let volatility = Self::trailing(&returns, VOLATILITY_WINDOW)
            .filter(|w| w.len() >= MIN_RETURNS_FOR_VOLATILITY)
            .and_then(Self::sample_std_dev);

        let trend_strength = Self::trailing(&returns, TREND_WINDOW)
            .filter(|w| w.len() >= MIN_RETURNS_FOR_VOLATILITY)
            .and_then(|w| {
                let mean = Self::mean(w)?;
                let std = Self::sample_std_dev(w)?;
                (std > 0.0).then(|| mean / std)
            });

        // Volume ratio compares today against the trailing days, excluding
        // today itself.
        let prior = &series[..series.len() - 1];
        let trailing_volumes: Vec<f64> = prior
            .iter()
            .rev()
            .take(VOLUME_WINDOW)
            .map(|p| p.volume)
            .collect();
        let volume_ratio = Self::mean(&trailing_volumes)
            .filter(|mean| *mean > 0.0)
            .map(|mean| last.volume / mean);

        Ok(DailyFeatureSet {
            market_id: market_id.to_string(),
            date: last.date,
            daily_return,
            volatility,
            trend_strength,
            volume_ratio,
        })
    }

    /// Last `window` elements of a slice, or `None` when it is empty
    fn trailing(values: &[f64], window: usize) -> Option<&[f64]> {
        if values.is_empty() {
            return None;
        }
        let start = values.len().saturating_sub(window);
        Some(&values[start..])
    }

    fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Sample standard deviation (n - 1 denominator)
    fn sample_std_dev(values: &[f64]) -> Option<f64> {
        if values.len() < 2 {
            return None;
        }
        let mean = Self::mean(values)?;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
            / (values.len() - 1) as f64;
        Some(var.sqrt())
    }
}
