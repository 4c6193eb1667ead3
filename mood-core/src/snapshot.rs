//! Persisted snapshot rows and the per-run summary

use crate::mood::MoodLevel;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One persisted (market, date) analytics row
///
/// Exactly one row exists per (market_id, date); re-running analysis for an
/// already-computed date overwrites the row in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyState {
    /// Market the row belongs to
    pub market_id: String,

    /// Trading date the row describes
    pub date: NaiveDate,

    /// Closing level of the index
    pub close_price: f64,

    /// Traded volume
    pub volume: f64,

    /// Percent change vs. the prior close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_pct: Option<f64>,

    /// Mood index in [-1, 1]; `None` when inputs were insufficient
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_index: Option<f64>,

    /// Mood bucket derived from the index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_level: Option<MoodLevel>,

    /// Trailing 30-day realized volatility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatility: Option<f64>,

    /// Trailing directional-persistence measure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_strength: Option<f64>,

    /// When the row was first written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// When the row was last overwritten
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A stored pairwise correlation between two markets for one date
///
/// Canonical: `source_id < target_id` lexically, so (A,B) and (B,A) can
/// never both exist. Self pairs are never constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationEdge {
    /// Lexically smaller market id of the pair
    pub source_id: String,

    /// Lexically larger market id of the pair
    pub target_id: String,

    /// Date the correlation window ends on
    pub date: NaiveDate,

    /// Pearson correlation coefficient in [-1, 1]
    pub value: f64,
}

impl CorrelationEdge {
    /// Build a canonical edge, ordering the pair by identifier
    ///
    /// Returns `None` for a self pair.
    pub fn new(a: &str, b: &str, date: NaiveDate, value: f64) -> Option<Self> {
        if a == b {
            return None;
        }
        let (source_id, target_id) = if a < b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        };
        Some(Self {
            source_id,
            target_id,
            date,
            value,
        })
    }
}

/// Per-market outcome of one orchestrated run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MarketOutcome {
    /// The market's series was fetched and analyzed
    Ok {
        /// Whether the series came from the synthetic fallback generator
        synthetic: bool,
    },
    /// The provider (and fallback, if any) could not supply a series
    FetchFailed { reason: String },
    /// A series was fetched but held too few points to analyze
    InsufficientData,
}

impl MarketOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, MarketOutcome::Ok { .. })
    }
}

/// Structured summary returned by every completed `run_snapshot`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// The analysis date the run targeted
    pub target_date: NaiveDate,

    /// Per-market outcome, one entry per configured market
    pub outcomes: Vec<(String, MarketOutcome)>,

    /// Markets whose DailyState row was written
    pub markets_written: usize,

    /// Canonical correlation edges written
    pub correlation_pairs_written: usize,

    /// Wall-clock duration of the run
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl RunSummary {
    /// Markets that fetched and analyzed successfully
    pub fn ok_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_ok()).count()
    }

    /// Markets whose fetch failed outright
    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, MarketOutcome::FetchFailed { .. }))
            .count()
    }
}

/// Serialize a `Duration` as whole milliseconds for API responses
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (d.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_edge_canonical_order() {
        let edge = CorrelationEdge::new("US_SPX", "EU_STOXX", date("2026-08-28"), 0.75).unwrap();
        assert_eq!(edge.source_id, "EU_STOXX");
        assert_eq!(edge.target_id, "US_SPX");

        let same = CorrelationEdge::new("EU_STOXX", "US_SPX", date("2026-08-28"), 0.75).unwrap();
        assert_eq!(edge, same);
    }

    #[test]
    fn test_edge_rejects_self_pair() {
        assert!(CorrelationEdge::new("US_SPX", "US_SPX", date("2026-08-28"), 1.0).is_none());
    }

    #[test]
    fn test_summary_counts() {
        let summary = RunSummary {
            target_date: date("2026-08-28"),
            outcomes: vec![
                ("US_SPX".to_string(), MarketOutcome::Ok { synthetic: false }),
                (
                    "JP_NIKKEI".to_string(),
                    MarketOutcome::FetchFailed {
                        reason: "timeout".to_string(),
                    },
                ),
                ("CN_SSE".to_string(), MarketOutcome::InsufficientData),
            ],
            markets_written: 2,
            correlation_pairs_written: 0,
            duration: Duration::from_millis(1200),
        };

        assert_eq!(summary.ok_count(), 1);
        assert_eq!(summary.failed_count(), 1);
    }
}
