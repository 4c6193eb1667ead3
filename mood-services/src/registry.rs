//! Default market registry
//!
//! The reference set of tracked global indices with their home-exchange
//! coordinates and classification. Seeded once at startup; seeding an
//! already-present id is a no-op.

use crate::snapshot_store::{SnapshotStore, SnapshotStoreError};
use mood_core::{MarketDescriptor, MarketGroup};
use tracing::info;

/// The default tracked indices
pub fn default_markets() -> Vec<MarketDescriptor> {
    fn market(
        id: &str,
        name: &str,
        latitude: f64,
        longitude: f64,
        group: MarketGroup,
        country: &str,
    ) -> MarketDescriptor {
        MarketDescriptor {
            id: id.to_string(),
            name: name.to_string(),
            latitude,
            longitude,
            group,
            country: Some(country.to_string()),
        }
    }

    vec![
        market("US_SPX", "S&P 500", 40.7128, -74.0060, MarketGroup::Developed, "United States"),
        market("US_IYY", "Dow Jones Industrial Average", 40.7128, -74.0060, MarketGroup::Developed, "United States"),
        market("US_CCMP", "Nasdaq Composite", 40.7128, -74.0060, MarketGroup::Developed, "United States"),
        market("EU_STOXX", "STOXX Europe 600", 50.1109, 8.6821, MarketGroup::Developed, "Germany"),
        market("GB_FTSE", "FTSE 100", 51.5074, -0.1278, MarketGroup::Developed, "United Kingdom"),
        market("JP_NIKKEI", "Nikkei 225", 35.6762, 139.6503, MarketGroup::Developed, "Japan"),
        market("CN_SSE", "Shanghai Composite", 31.2304, 121.4737, MarketGroup::Emerging, "China"),
        market("IN_SENSEX", "BSE Sensex", 19.0760, 72.8777, MarketGroup::Emerging, "India"),
        market("BR_IBOV", "Bovespa", -23.5505, -46.6333, MarketGroup::Emerging, "Brazil"),
        market("KR_KOSPI", "KOSPI", 37.5665, 126.9780, MarketGroup::Emerging, "South Korea"),
        market("RU_MOEX", "MOEX Russia", 55.7558, 37.6173, MarketGroup::Emerging, "Russia"),
        market("AU_ASX", "ASX 200", -33.8688, 151.2093, MarketGroup::Developed, "Australia"),
        market("CH_SMI", "Swiss Market Index", 47.3769, 8.5417, MarketGroup::Developed, "Switzerland"),
        market("SG_STI", "Straits Times Index", 1.3521, 103.8198, MarketGroup::Developed, "Singapore"),
        market("MX_MEXBOL", "IPC Mexico", 19.4326, -99.1332, MarketGroup::Emerging, "Mexico"),
    ]
}

/// Seed the registry with the default markets
///
/// Returns how many rows were newly inserted.
pub fn seed_default_markets(store: &SnapshotStore) -> Result<usize, SnapshotStoreError> {
    let mut inserted = 0;
    for market in default_markets() {
        if store.seed_market(&market)? {
            inserted += 1;
        }
    }

    if inserted > 0 {
        info!("Seeded {} markets into the registry", inserted);
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ids_are_unique_and_mapped() {
        let markets = default_markets();
        let mut ids: Vec<&str> = markets.iter().map(|m| m.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), markets.len());

        // Every registry entry must resolve to a provider symbol
        for market in &markets {
            assert!(
                mood_ingest::provider_symbol(&market.id).is_some(),
                "no symbol for {}",
                market.id
            );
        }
    }

    #[test]
    fn test_seeding_twice_inserts_once() {
        let store = SnapshotStore::new_in_memory().unwrap();

        let first = seed_default_markets(&store).unwrap();
        assert_eq!(first, default_markets().len());

        let second = seed_default_markets(&store).unwrap();
        assert_eq!(second, 0);
        assert_eq!(store.list_markets().unwrap().len(), first);
    }
}
