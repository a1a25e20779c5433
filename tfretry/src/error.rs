//! Error types for tfretry

use std::time::Duration;

/// Error returned when a retry policy cannot be used as configured
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("Retry timeout must be greater than zero")]
    ZeroTimeout,

    #[error("Retry timeout {timeout:?} exceeds maximum {max:?}")]
    TimeoutTooLong { timeout: Duration, max: Duration },

    #[error("Backoff multiplier must be at least 1.0, got {0}")]
    InvalidMultiplier(f64),

    #[error("Initial backoff {initial:?} exceeds maximum backoff {max:?}")]
    InitialExceedsMax { initial: Duration, max: Duration },
}

/// Result type alias for policy construction
pub type Result<T> = std::result::Result<T, PolicyError>;
