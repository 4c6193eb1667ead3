//! Market registry and raw series types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a market in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketGroup {
    /// Established markets with deep liquidity (US, EU, JP, ...)
    Developed,
    /// Emerging markets (CN, IN, BR, ...)
    Emerging,
}

impl MarketGroup {
    /// Stable string form used in the registry table
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketGroup::Developed => "developed",
            MarketGroup::Emerging => "emerging",
        }
    }
}

impl fmt::Display for MarketGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MarketGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "developed" => Ok(MarketGroup::Developed),
            "emerging" => Ok(MarketGroup::Emerging),
            _ => Err(format!("Unknown market group: {}", s)),
        }
    }
}

/// A tracked market index in the registry
///
/// Immutable reference data: created at registry-seed time and read-only
/// afterward. The `id` is the stable internal key (e.g. "US_SPX"); provider
/// symbols are mapped to it at the ingestion boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDescriptor {
    /// Stable internal identifier, unique across the registry
    pub id: String,

    /// Human-readable index name (e.g. "S&P 500")
    pub name: String,

    /// Latitude of the market's home exchange (for the world map)
    pub latitude: f64,

    /// Longitude of the market's home exchange
    pub longitude: f64,

    /// Developed / emerging classification
    pub group: MarketGroup,

    /// Country of the home exchange
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// One day of raw provider data for a single market
///
/// Transient: produced by the ingestion adapter, consumed by the feature
/// calculator, never persisted directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSeriesPoint {
    /// Trading date
    pub date: NaiveDate,
    /// Closing level of the index, strictly positive
    pub close: f64,
    /// Traded volume, non-negative (0 when the venue reports none)
    pub volume: f64,
}

impl RawSeriesPoint {
    pub fn new(date: NaiveDate, close: f64, volume: f64) -> Self {
        Self {
            date,
            close,
            volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_group_round_trip() {
        assert_eq!("developed".parse::<MarketGroup>(), Ok(MarketGroup::Developed));
        assert_eq!("Emerging".parse::<MarketGroup>(), Ok(MarketGroup::Emerging));
        assert!("frontier".parse::<MarketGroup>().is_err());
        assert_eq!(MarketGroup::Developed.as_str(), "developed");
    }
}
