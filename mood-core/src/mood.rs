//! Derived daily features and mood classification

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-day derived features for one market
///
/// Fields are `None` when the trailing window is too short to compute them;
/// a missing feature is never fabricated as zero. The first point of any
/// series has no prior close, so its `daily_return` is always `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyFeatureSet {
    /// Market the features belong to
    pub market_id: String,

    /// Date the features describe
    pub date: NaiveDate,

    /// Fractional change vs. the prior close: (c[t] - c[t-1]) / c[t-1]
    pub daily_return: Option<f64>,

    /// Sample standard deviation of the trailing <=30 daily returns
    pub volatility: Option<f64>,

    /// Directional persistence: mean trailing return / its dispersion
    pub trend_strength: Option<f64>,

    /// Current volume relative to the trailing mean volume
    pub volume_ratio: Option<f64>,
}

/// Discrete mood bucket derived from the mood index
///
/// Ordered from most bearish to most bullish; bucketing is a total,
/// monotonic function of the mood index over [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodLevel {
    VeryBearish,
    Bearish,
    Neutral,
    Bullish,
    VeryBullish,
}

impl MoodLevel {
    /// Bucket a mood index into a level
    ///
    /// Thresholds: < -0.5 very bearish, < -0.1 bearish, < 0.1 neutral,
    /// < 0.5 bullish, else very bullish.
    pub fn from_index(mood_index: f64) -> Self {
        if mood_index < -0.5 {
            MoodLevel::VeryBearish
        } else if mood_index < -0.1 {
            MoodLevel::Bearish
        } else if mood_index < 0.1 {
            MoodLevel::Neutral
        } else if mood_index < 0.5 {
            MoodLevel::Bullish
        } else {
            MoodLevel::VeryBullish
        }
    }

    /// Stable string form used in the daily_state table
    pub fn as_str(&self) -> &'static str {
        match self {
            MoodLevel::VeryBearish => "very_bearish",
            MoodLevel::Bearish => "bearish",
            MoodLevel::Neutral => "neutral",
            MoodLevel::Bullish => "bullish",
            MoodLevel::VeryBullish => "very_bullish",
        }
    }
}

impl fmt::Display for MoodLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MoodLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "very_bearish" => Ok(MoodLevel::VeryBearish),
            "bearish" => Ok(MoodLevel::Bearish),
            "neutral" => Ok(MoodLevel::Neutral),
            "bullish" => Ok(MoodLevel::Bullish),
            "very_bullish" => Ok(MoodLevel::VeryBullish),
            _ => Err(format!("Unknown mood level: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucketing_is_total_over_range() {
        let mut x = -1.0_f64;
        while x <= 1.0 {
            // from_index must return a level for every index in [-1, 1]
            let _ = MoodLevel::from_index(x);
            x += 0.01;
        }
    }

    #[test]
    fn test_bucketing_thresholds() {
        assert_eq!(MoodLevel::from_index(-1.0), MoodLevel::VeryBearish);
        assert_eq!(MoodLevel::from_index(-0.5), MoodLevel::Bearish);
        assert_eq!(MoodLevel::from_index(-0.1), MoodLevel::Neutral);
        assert_eq!(MoodLevel::from_index(0.0), MoodLevel::Neutral);
        assert_eq!(MoodLevel::from_index(0.1), MoodLevel::Bullish);
        assert_eq!(MoodLevel::from_index(0.5), MoodLevel::VeryBullish);
        assert_eq!(MoodLevel::from_index(1.0), MoodLevel::VeryBullish);
    }

    #[test]
    fn test_bucketing_is_monotonic() {
        let mut prev = MoodLevel::from_index(-1.0);
        let mut x = -1.0_f64;
        while x <= 1.0 {
            let level = MoodLevel::from_index(x);
            assert!(level >= prev, "level decreased at index {}", x);
            prev = level;
            x += 0.001;
        }
    }

    #[test]
    fn test_level_string_round_trip() {
        for level in [
            MoodLevel::VeryBearish,
            MoodLevel::Bearish,
            MoodLevel::Neutral,
            MoodLevel::Bullish,
            MoodLevel::VeryBullish,
        ] {
            assert_eq!(level.as_str().parse::<MoodLevel>(), Ok(level));
        }
    }
}
