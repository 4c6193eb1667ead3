//! Error types for the mood pipeline

use thiserror::Error;

/// Pipeline-wide error type
///
/// Per-market and per-pair conditions are recoverable and are normally
/// folded into the run summary instead of being raised; only a wholly
/// failed run or a store write surfaces one of these to the caller.
#[derive(Error, Debug)]
pub enum MoodError {
    #[error("Provider error for {market}: {message}")]
    Provider { market: String, message: String },

    #[error("Insufficient data for {market}")]
    InsufficientData { market: String },

    #[error("Aligned window too short for ({source_market}, {target}): {points} points")]
    AlignmentTooShort {
        source_market: String,
        target: String,
        points: usize,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MoodError {
    pub fn provider(market: impl Into<String>, message: impl Into<String>) -> Self {
        MoodError::Provider {
            market: market.into(),
            message: message.into(),
        }
    }

    pub fn insufficient_data(market: impl Into<String>) -> Self {
        MoodError::InsufficientData {
            market: market.into(),
        }
    }

    pub fn alignment_too_short(
        source: impl Into<String>,
        target: impl Into<String>,
        points: usize,
    ) -> Self {
        MoodError::AlignmentTooShort {
            source_market: source.into(),
            target: target.into(),
            points,
        }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        MoodError::Store(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        MoodError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        MoodError::Internal(msg.into())
    }
}

/// Result type alias for pipeline operations
pub type MoodResult<T> = Result<T, MoodError>;
