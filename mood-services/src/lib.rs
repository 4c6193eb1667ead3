//! Services for the Global Market Mood pipeline
//!
//! This crate owns every side effect of the pipeline: the SQLite snapshot
//! store, the default market registry, the snapshot orchestrator that
//! drives one end-to-end analysis run, and the background scheduler for
//! recurring runs and data retention.

pub mod orchestrator;
pub mod registry;
pub mod scheduler;
pub mod snapshot_store;

pub use orchestrator::{OrchestratorConfig, SnapshotOrchestrator};
pub use registry::{default_markets, seed_default_markets};
pub use scheduler::{Scheduler, SchedulerConfig};
pub use snapshot_store::{SnapshotStore, SnapshotStoreError, SnapshotView};
