//! Snapshot Store
//!
//! SQLite-based persistence for the market registry, per-day market states,
//! and correlation edges. The (market_id, date) and canonical
//! (source_id, target_id, date) primary keys are the serialization
//! boundary: concurrent writers for the same key upsert, last writer wins,
//! and re-running a date reproduces the same rows.

use chrono::{DateTime, NaiveDate};
use mood_core::{CorrelationEdge, DailyState, MarketDescriptor, MarketGroup, MoodLevel};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;

/// Snapshot storage service using SQLite
pub struct SnapshotStore {
    conn: Mutex<Connection>,
}

impl SnapshotStore {
    /// Create a new SnapshotStore instance
    ///
    /// Creates the database file and tables if they don't exist.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, SnapshotStoreError> {
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SnapshotStoreError::Io(format!("Failed to create database directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path).map_err(SnapshotStoreError::Database)?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;

        Ok(store)
    }

    /// Create an in-memory SnapshotStore (useful for testing)
    pub fn new_in_memory() -> Result<Self, SnapshotStoreError> {
        let conn = Connection::open_in_memory().map_err(SnapshotStoreError::Database)?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;

        Ok(store)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<(), SnapshotStoreError> {
        let conn = self.conn.lock().map_err(|_| SnapshotStoreError::LockError)?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS market_registry (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                market_group TEXT NOT NULL,
                country TEXT,
                created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            );

            CREATE TABLE IF NOT EXISTS daily_state (
                market_id TEXT NOT NULL,
                date TEXT NOT NULL,
                close_price REAL NOT NULL,
                volume REAL NOT NULL,
                change_pct REAL,
                mood_index REAL,
                mood_level TEXT,
                volatility REAL,
                trend_strength REAL,
                created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
                updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
                PRIMARY KEY (market_id, date)
            );

            CREATE INDEX IF NOT EXISTS idx_daily_state_date
            ON daily_state(date);

            CREATE TABLE IF NOT EXISTS correlation_edges (
                source_id TEXT NOT NULL,
                target_id TEXT NOT NULL,
                date TEXT NOT NULL,
                correlation_value REAL NOT NULL,
                created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
                updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
                PRIMARY KEY (source_id, target_id, date),
                CHECK (source_id < target_id)
            );

            CREATE INDEX IF NOT EXISTS idx_correlation_edges_date
            ON correlation_edges(date);
            "#,
        )
        .map_err(SnapshotStoreError::Database)?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Insert a registry entry if its id is not present yet
    ///
    /// Registry rows are immutable reference data: seeding an existing id
    /// is a no-op, never an overwrite.
    pub fn seed_market(&self, market: &MarketDescriptor) -> Result<bool, SnapshotStoreError> {
        let conn = self.conn.lock().map_err(|_| SnapshotStoreError::LockError)?;

        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO market_registry (id, name, latitude, longitude, market_group, country)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                market.id,
                market.name,
                market.latitude,
                market.longitude,
                market.group.as_str(),
                market.country,
            ],
        )
        .map_err(SnapshotStoreError::Database)?;

        Ok(inserted > 0)
    }

    /// All registered markets, ordered by id
    pub fn list_markets(&self) -> Result<Vec<MarketDescriptor>, SnapshotStoreError> {
        let conn = self.conn.lock().map_err(|_| SnapshotStoreError::LockError)?;

        let mut stmt = conn
            .prepare(
                "SELECT id, name, latitude, longitude, market_group, country
                 FROM market_registry ORDER BY id",
            )
            .map_err(SnapshotStoreError::Database)?;

        let markets = stmt
            .query_map([], row_to_market)
            .map_err(SnapshotStoreError::Database)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(SnapshotStoreError::Database)?;

        Ok(markets)
    }

    /// Look up one registry entry
    pub fn get_market(&self, id: &str) -> Result<Option<MarketDescriptor>, SnapshotStoreError> {
        let conn = self.conn.lock().map_err(|_| SnapshotStoreError::LockError)?;

        conn.query_row(
            "SELECT id, name, latitude, longitude, market_group, country
             FROM market_registry WHERE id = ?1",
            params![id],
            row_to_market,
        )
        .optional()
        .map_err(SnapshotStoreError::Database)
    }

    // ------------------------------------------------------------------
    // Snapshot write path
    // ------------------------------------------------------------------

    /// Persist one run's DailyState rows and correlation edges atomically
    ///
    /// The whole batch commits or rolls back as one transaction; a partial
    /// write can never leave a mixed state for a date. Rows upsert on
    /// their unique keys, so re-persisting a date is always safe.
    pub fn persist_snapshot(
        &self,
        states: &[DailyState],
        edges: &[CorrelationEdge],
    ) -> Result<(), SnapshotStoreError> {
        let mut conn = self.conn.lock().map_err(|_| SnapshotStoreError::LockError)?;
        let tx = conn.transaction().map_err(SnapshotStoreError::Database)?;

        {
            let mut state_stmt = tx
                .prepare(
                    r#"
                    INSERT INTO daily_state
                        (market_id, date, close_price, volume, change_pct,
                         mood_index, mood_level, volatility, trend_strength)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT (market_id, date) DO UPDATE SET
                        close_price = excluded.close_price,
                        volume = excluded.volume,
                        change_pct = excluded.change_pct,
                        mood_index = excluded.mood_index,
                        mood_level = excluded.mood_level,
                        volatility = excluded.volatility,
                        trend_strength = excluded.trend_strength,
                        updated_at = strftime('%s', 'now')
                    "#,
                )
                .map_err(SnapshotStoreError::Database)?;

            for state in states {
                state_stmt
                    .execute(params![
                        state.market_id,
                        state.date.to_string(),
                        state.close_price,
                        state.volume,
                        state.change_pct,
                        state.mood_index,
                        state.mood_level.map(|l| l.as_str()),
                        state.volatility,
                        state.trend_strength,
                    ])
                    .map_err(SnapshotStoreError::Database)?;
            }

            let mut edge_stmt = tx
                .prepare(
                    r#"
                    INSERT INTO correlation_edges (source_id, target_id, date, correlation_value)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT (source_id, target_id, date) DO UPDATE SET
                        correlation_value = excluded.correlation_value,
                        updated_at = strftime('%s', 'now')
                    "#,
                )
                .map_err(SnapshotStoreError::Database)?;

            for edge in edges {
                edge_stmt
                    .execute(params![
                        edge.source_id,
                        edge.target_id,
                        edge.date.to_string(),
                        edge.value,
                    ])
                    .map_err(SnapshotStoreError::Database)?;
            }
        }

        tx.commit().map_err(SnapshotStoreError::Database)
    }

    // ------------------------------------------------------------------
    // Read path
    // ------------------------------------------------------------------

    /// One market's state row for one date
    pub fn get_daily_state(
        &self,
        market_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyState>, SnapshotStoreError> {
        let conn = self.conn.lock().map_err(|_| SnapshotStoreError::LockError)?;

        conn.query_row(
            &format!("{} WHERE market_id = ?1 AND date = ?2", DAILY_STATE_SELECT),
            params![market_id, date.to_string()],
            row_to_daily_state,
        )
        .optional()
        .map_err(SnapshotStoreError::Database)
    }

    /// All state rows for one date, ordered by market id
    pub fn daily_states_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<DailyState>, SnapshotStoreError> {
        let conn = self.conn.lock().map_err(|_| SnapshotStoreError::LockError)?;

        let mut stmt = conn
            .prepare(&format!(
                "{} WHERE date = ?1 ORDER BY market_id",
                DAILY_STATE_SELECT
            ))
            .map_err(SnapshotStoreError::Database)?;

        let states = stmt
            .query_map(params![date.to_string()], row_to_daily_state)
            .map_err(SnapshotStoreError::Database)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(SnapshotStoreError::Database)?;

        Ok(states)
    }

    /// All correlation edges for one date, canonical order
    pub fn edges_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<CorrelationEdge>, SnapshotStoreError> {
        let conn = self.conn.lock().map_err(|_| SnapshotStoreError::LockError)?;

        let mut stmt = conn
            .prepare(
                "SELECT source_id, target_id, date, correlation_value
                 FROM correlation_edges WHERE date = ?1
                 ORDER BY source_id, target_id",
            )
            .map_err(SnapshotStoreError::Database)?;

        let edges = stmt
            .query_map(params![date.to_string()], row_to_edge)
            .map_err(SnapshotStoreError::Database)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(SnapshotStoreError::Database)?;

        Ok(edges)
    }

    /// The most recent snapshot: all state rows and edges of the latest date
    pub fn latest_snapshot(&self) -> Result<Option<SnapshotView>, SnapshotStoreError> {
        let latest: Option<String> = {
            let conn = self.conn.lock().map_err(|_| SnapshotStoreError::LockError)?;
            conn.query_row("SELECT MAX(date) FROM daily_state", [], |row| row.get(0))
                .map_err(SnapshotStoreError::Database)?
        };

        let Some(date_str) = latest else {
            return Ok(None);
        };
        let date: NaiveDate = date_str
            .parse()
            .map_err(|_| SnapshotStoreError::Corrupt(format!("bad date: {}", date_str)))?;

        Ok(Some(SnapshotView {
            date,
            markets: self.daily_states_for_date(date)?,
            correlations: self.edges_for_date(date)?,
        }))
    }

    /// Recent state rows for one market, newest first
    pub fn market_history(
        &self,
        market_id: &str,
        limit: usize,
    ) -> Result<Vec<DailyState>, SnapshotStoreError> {
        let conn = self.conn.lock().map_err(|_| SnapshotStoreError::LockError)?;

        let mut stmt = conn
            .prepare(&format!(
                "{} WHERE market_id = ?1 ORDER BY date DESC LIMIT ?2",
                DAILY_STATE_SELECT
            ))
            .map_err(SnapshotStoreError::Database)?;

        let states = stmt
            .query_map(params![market_id, limit as i64], row_to_daily_state)
            .map_err(SnapshotStoreError::Database)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(SnapshotStoreError::Database)?;

        Ok(states)
    }

    // ------------------------------------------------------------------
    // Retention
    // ------------------------------------------------------------------

    /// Delete state rows and edges strictly older than `before`
    ///
    /// Returns the number of daily_state rows deleted.
    pub fn prune_before(&self, before: NaiveDate) -> Result<usize, SnapshotStoreError> {
        let conn = self.conn.lock().map_err(|_| SnapshotStoreError::LockError)?;

        let deleted = conn
            .execute(
                "DELETE FROM daily_state WHERE date < ?1",
                params![before.to_string()],
            )
            .map_err(SnapshotStoreError::Database)?;

        conn.execute(
            "DELETE FROM correlation_edges WHERE date < ?1",
            params![before.to_string()],
        )
        .map_err(SnapshotStoreError::Database)?;

        Ok(deleted)
    }
}

const DAILY_STATE_SELECT: &str = "SELECT market_id, date, close_price, volume, change_pct, \
     mood_index, mood_level, volatility, trend_strength, created_at, updated_at FROM daily_state";

fn row_to_market(row: &rusqlite::Row<'_>) -> rusqlite::Result<MarketDescriptor> {
    let group: String = row.get(4)?;
    Ok(MarketDescriptor {
        id: row.get(0)?,
        name: row.get(1)?,
        latitude: row.get(2)?,
        longitude: row.get(3)?,
        group: group.parse().unwrap_or(MarketGroup::Developed),
        country: row.get(5)?,
    })
}

fn row_to_daily_state(row: &rusqlite::Row<'_>) -> rusqlite::Result<DailyState> {
    let date: String = row.get(1)?;
    let mood_level: Option<String> = row.get(6)?;
    let created_at: i64 = row.get(9)?;
    let updated_at: i64 = row.get(10)?;

    Ok(DailyState {
        market_id: row.get(0)?,
        date: date.parse().map_err(|_| rusqlite::Error::InvalidQuery)?,
        close_price: row.get(2)?,
        volume: row.get(3)?,
        change_pct: row.get(4)?,
        mood_index: row.get(5)?,
        mood_level: mood_level.and_then(|l| l.parse::<MoodLevel>().ok()),
        volatility: row.get(7)?,
        trend_strength: row.get(8)?,
        created_at: DateTime::from_timestamp(created_at, 0),
        updated_at: DateTime::from_timestamp(updated_at, 0),
    })
}

fn row_to_edge(row: &rusqlite::Row<'_>) -> rusqlite::Result<CorrelationEdge> {
    let date: String = row.get(2)?;
    Ok(CorrelationEdge {
        source_id: row.get(0)?,
        target_id: row.get(1)?,
        date: date.parse().map_err(|_| rusqlite::Error::InvalidQuery)?,
        value: row.get(3)?,
    })
}

/// The full set of rows written by one orchestrated run for one date
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotView {
    pub date: NaiveDate,
    pub markets: Vec<DailyState>,
    pub correlations: Vec<CorrelationEdge>,
}

/// Errors that can occur during snapshot storage operations
#[derive(Debug, thiserror::Error)]
pub enum SnapshotStoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Failed to acquire lock")]
    LockError,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn test_state(market_id: &str, d: &str, mood: Option<f64>) -> DailyState {
        DailyState {
            market_id: market_id.to_string(),
            date: date(d),
            close_price: 4500.0,
            volume: 1_000_000.0,
            change_pct: Some(0.5),
            mood_index: mood,
            mood_level: mood.map(MoodLevel::from_index),
            volatility: Some(0.012),
            trend_strength: Some(0.3),
            created_at: None,
            updated_at: None,
        }
    }

    fn strip_timestamps(mut state: DailyState) -> DailyState {
        state.created_at = None;
        state.updated_at = None;
        state
    }

    #[test]
    fn test_registry_seed_is_insert_only() {
        let store = SnapshotStore::new_in_memory().unwrap();
        let market = MarketDescriptor {
            id: "US_SPX".to_string(),
            name: "S&P 500".to_string(),
            latitude: 40.7128,
            longitude: -74.0060,
            group: MarketGroup::Developed,
            country: Some("United States".to_string()),
        };

        assert!(store.seed_market(&market).unwrap());
        // Second seed with a different name must not overwrite
        let renamed = MarketDescriptor {
            name: "Other".to_string(),
            ..market.clone()
        };
        assert!(!store.seed_market(&renamed).unwrap());
        assert_eq!(store.get_market("US_SPX").unwrap().unwrap().name, "S&P 500");
    }

    #[test]
    fn test_daily_state_upsert_keeps_one_row_per_key() {
        let store = SnapshotStore::new_in_memory().unwrap();

        store
            .persist_snapshot(&[test_state("US_SPX", "2026-08-28", Some(0.2))], &[])
            .unwrap();
        store
            .persist_snapshot(&[test_state("US_SPX", "2026-08-28", Some(-0.4))], &[])
            .unwrap();

        let rows = store.daily_states_for_date(date("2026-08-28")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].mood_index, Some(-0.4));
        assert_eq!(rows[0].mood_level, Some(MoodLevel::Bearish));
    }

    #[test]
    fn test_persist_is_idempotent() {
        let store = SnapshotStore::new_in_memory().unwrap();
        let states = vec![
            test_state("EU_STOXX", "2026-08-28", Some(0.1)),
            test_state("US_SPX", "2026-08-28", None),
        ];
        let edges =
            vec![CorrelationEdge::new("US_SPX", "EU_STOXX", date("2026-08-28"), 0.75).unwrap()];

        store.persist_snapshot(&states, &edges).unwrap();
        let first: Vec<DailyState> = store
            .daily_states_for_date(date("2026-08-28"))
            .unwrap()
            .into_iter()
            .map(strip_timestamps)
            .collect();
        let first_edges = store.edges_for_date(date("2026-08-28")).unwrap();

        store.persist_snapshot(&states, &edges).unwrap();
        let second: Vec<DailyState> = store
            .daily_states_for_date(date("2026-08-28"))
            .unwrap()
            .into_iter()
            .map(strip_timestamps)
            .collect();
        let second_edges = store.edges_for_date(date("2026-08-28")).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_edges, second_edges);
    }

    #[test]
    fn test_non_canonical_edge_is_rejected_by_schema() {
        let store = SnapshotStore::new_in_memory().unwrap();
        // Bypass the canonicalizing constructor on purpose
        let edge = CorrelationEdge {
            source_id: "US_SPX".to_string(),
            target_id: "EU_STOXX".to_string(),
            date: date("2026-08-28"),
            value: 0.5,
        };

        let err = store.persist_snapshot(&[], &[edge]).unwrap_err();
        assert!(matches!(err, SnapshotStoreError::Database(_)));
    }

    #[test]
    fn test_failed_batch_rolls_back_entirely() {
        let store = SnapshotStore::new_in_memory().unwrap();
        let bad_edge = CorrelationEdge {
            source_id: "US_SPX".to_string(),
            target_id: "EU_STOXX".to_string(),
            date: date("2026-08-28"),
            value: 0.5,
        };

        let result = store.persist_snapshot(
            &[test_state("US_SPX", "2026-08-28", Some(0.2))],
            &[bad_edge],
        );
        assert!(result.is_err());

        // The state row from the same batch must not have survived
        assert!(store
            .daily_states_for_date(date("2026-08-28"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_latest_snapshot_picks_most_recent_date() {
        let store = SnapshotStore::new_in_memory().unwrap();

        store
            .persist_snapshot(&[test_state("US_SPX", "2026-08-27", Some(0.1))], &[])
            .unwrap();
        store
            .persist_snapshot(
                &[
                    test_state("US_SPX", "2026-08-28", Some(0.2)),
                    test_state("EU_STOXX", "2026-08-28", Some(-0.2)),
                ],
                &[CorrelationEdge::new("US_SPX", "EU_STOXX", date("2026-08-28"), 0.6).unwrap()],
            )
            .unwrap();

        let snapshot = store.latest_snapshot().unwrap().unwrap();
        assert_eq!(snapshot.date, date("2026-08-28"));
        assert_eq!(snapshot.markets.len(), 2);
        assert_eq!(snapshot.correlations.len(), 1);
    }

    #[test]
    fn test_empty_store_has_no_snapshot() {
        let store = SnapshotStore::new_in_memory().unwrap();
        assert!(store.latest_snapshot().unwrap().is_none());
    }

    #[test]
    fn test_market_history_is_newest_first() {
        let store = SnapshotStore::new_in_memory().unwrap();
        for d in ["2026-08-26", "2026-08-27", "2026-08-28"] {
            store
                .persist_snapshot(&[test_state("US_SPX", d, Some(0.1))], &[])
                .unwrap();
        }

        let history = store.market_history("US_SPX", 2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, date("2026-08-28"));
        assert_eq!(history[1].date, date("2026-08-27"));
    }

    #[test]
    fn test_prune_deletes_only_older_rows() {
        let store = SnapshotStore::new_in_memory().unwrap();
        for d in ["2026-05-01", "2026-08-28"] {
            store
                .persist_snapshot(
                    &[
                        test_state("EU_STOXX", d, Some(0.1)),
                        test_state("US_SPX", d, Some(0.1)),
                    ],
                    &[CorrelationEdge::new("US_SPX", "EU_STOXX", date(d), 0.5).unwrap()],
                )
                .unwrap();
        }

        let deleted = store.prune_before(date("2026-06-01")).unwrap();
        assert_eq!(deleted, 2);
        assert!(store
            .daily_states_for_date(date("2026-05-01"))
            .unwrap()
            .is_empty());
        assert!(store.edges_for_date(date("2026-05-01")).unwrap().is_empty());
        assert_eq!(
            store
                .daily_states_for_date(date("2026-08-28"))
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_null_mood_round_trips_as_null() {
        let store = SnapshotStore::new_in_memory().unwrap();
        store
            .persist_snapshot(&[test_state("US_SPX", "2026-08-28", None)], &[])
            .unwrap();

        let row = store
            .get_daily_state("US_SPX", date("2026-08-28"))
            .unwrap()
            .unwrap();
        assert_eq!(row.mood_index, None);
        assert_eq!(row.mood_level, None);
    }
}
