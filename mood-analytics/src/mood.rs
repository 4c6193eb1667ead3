//! Mood Engine
//!
//! Combines one day's features for one market into a scalar mood index in
//! [-1, 1] and its discrete level. The weighted sum is clipped, not
//! rescaled, so interior values keep their natural meaning.

use mood_core::{DailyFeatureSet, MoodLevel};

/// Weight of the daily return term
pub const RETURN_WEIGHT: f64 = 0.5;

/// Weight of the volatility term (high volatility reads bearish)
pub const VOLATILITY_WEIGHT: f64 = 0.3;

/// Weight of the volume-score term
pub const VOLUME_WEIGHT: f64 = 0.2;

/// Pure mood-index computation
pub struct MoodEngine;

impl MoodEngine {
    /// Bounded transform of the volume ratio
    ///
    /// A ratio of 1.0 (volume at its trailing average) scores 0; the score
    /// saturates at +-1 so a volume spike cannot dominate the index. A
    /// missing ratio scores neutral.
    pub fn volume_score(volume_ratio: Option<f64>) -> f64 {
        volume_ratio.map(|r| (r - 1.0).clamp(-1.0, 1.0)).unwrap_or(0.0)
    }

    /// Mood index for one feature set
    ///
    /// `None` when the return or volatility input is missing: a null mood
    /// means "insufficient data" and is distinct from a computed zero.
    pub fn mood_index(features: &DailyFeatureSet) -> Option<f64> {
        let daily_return = features.daily_return?;
        let volatility = features.volatility?;

        let raw = RETURN_WEIGHT * daily_return - VOLATILITY_WEIGHT * volatility
            + VOLUME_WEIGHT * Self::volume_score(features.volume_ratio);

        Some(raw.clamp(-1.0, 1.0))
    }

    /// Mood index plus its bucketed level
    pub fn mood(features: &DailyFeatureSet) -> (Option<f64>, Option<MoodLevel>) {
        let index = Self::mood_index(features);
        (index, index.map(MoodLevel::from_index))
    }
}
