//! Analytics for the Global Market Mood pipeline
//!
//! Three pure calculators, each a function of the values passed to it:
//! per-market daily features, the scalar mood index with its discrete
//! level, and the pairwise correlation matrix. No I/O happens here; the
//! orchestrator in `mood-services` owns all side effects.

pub mod correlation;
pub mod feature;
pub mod mood;

pub use correlation::{CorrelationCalculator, MIN_ALIGNED_POINTS};
pub use feature::{FeatureCalculator, TREND_WINDOW, VOLATILITY_WINDOW, VOLUME_WINDOW};
pub use mood::MoodEngine;
