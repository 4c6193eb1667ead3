//! Core types for the Global Market Mood pipeline
//!
//! This crate defines the shared data structures used across the pipeline,
//! including the market registry entries, raw price series, derived daily
//! features, mood classification, and persisted snapshot rows.

pub mod error;
pub mod market;
pub mod mood;
pub mod snapshot;

pub use error::{MoodError, MoodResult};
pub use market::{MarketDescriptor, MarketGroup, RawSeriesPoint};
pub use mood::{DailyFeatureSet, MoodLevel};
pub use snapshot::{CorrelationEdge, DailyState, MarketOutcome, RunSummary};
