//! Retry budgets and backoff

use crate::error::{PolicyError, Result};
use std::time::Duration;

/// Default budget for read/query operations
pub const READ_RETRY_TIMEOUT: Duration = Duration::from_secs(3 * 60);

/// Default budget for write/mutate operations
pub const WRITE_RETRY_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Longest budget a policy accepts
pub const MAX_RETRY_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Which budget tier an operation draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Read,
    Write,
}

/// Process-wide read and write budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub read: Duration,
    pub write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            read: READ_RETRY_TIMEOUT,
            write: WRITE_RETRY_TIMEOUT,
        }
    }
}

impl Timeouts {
    pub fn for_kind(&self, kind: OperationKind) -> Duration {
        match kind {
            OperationKind::Read => self.read,
            OperationKind::Write => self.write,
        }
    }
}

/// Delay between attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay before every retry
    Fixed(Duration),
    /// `initial * multiplier^(n-1)` before the n-th retry, capped at `max`
    Exponential {
        initial: Duration,
        max: Duration,
        multiplier: f64,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::Exponential {
            initial: Duration::from_millis(100),
            max: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl Backoff {
    /// Delay before retry number `retry` (1 for the first retry)
    pub fn delay(&self, retry: u32) -> Duration {
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let exp = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
                let secs = initial.as_secs_f64() * multiplier.powi(exp);
                if secs.is_nan() || secs <= 0.0 {
                    initial
                } else if secs.is_infinite() || secs >= max.as_secs_f64() {
                    max
                } else {
                    Duration::from_secs_f64(secs)
                }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            Backoff::Fixed(_) => Ok(()),
            Backoff::Exponential {
                initial,
                max,
                multiplier,
            } => {
                if multiplier.is_nan() || multiplier < 1.0 {
                    return Err(PolicyError::InvalidMultiplier(multiplier));
                }
                if initial > max {
                    return Err(PolicyError::InitialExceedsMax { initial, max });
                }
                Ok(())
            }
        }
    }
}

/// Total time budget plus backoff behaviour for one call site
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            backoff: Backoff::default(),
        }
    }

    /// Policy using the read budget
    pub fn read(timeouts: &Timeouts) -> Self {
        Self::for_kind(OperationKind::Read, timeouts)
    }

    /// Policy using the write budget
    pub fn write(timeouts: &Timeouts) -> Self {
        Self::for_kind(OperationKind::Write, timeouts)
    }

    pub fn for_kind(kind: OperationKind, timeouts: &Timeouts) -> Self {
        Self::new(timeouts.for_kind(kind))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(PolicyError::ZeroTimeout);
        }
        if self.timeout > MAX_RETRY_TIMEOUT {
            return Err(PolicyError::TimeoutTooLong {
                timeout: self.timeout,
                max: MAX_RETRY_TIMEOUT,
            });
        }
        self.backoff.validate()
    }
}
