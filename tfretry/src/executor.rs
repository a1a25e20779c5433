//! Bounded retry loop for idempotent operations
//!
//! [`RetryExecutor`] invokes an operation until it succeeds, fails with a
//! non-retryable error, reports that its target is gone, or the policy's
//! wall-clock budget runs out. Each invocation is one attempt; the executor
//! owns the sleeping between attempts.
//!
//! Per invocation the executor moves through
//! `Pending -> (Success | RetryWait -> Pending | Failed)`; nothing survives
//! the return.

use crate::classify::{Classification, ClassifiedError, Classify};
use crate::context::RequestContext;
use crate::policy::RetryPolicy;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;

/// Deadline used when `now + timeout` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Successful result of a retried operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation completed and produced a value
    Completed(T),
    /// The operation reported that its target does not exist
    NotFound,
}

impl<T> Outcome<T> {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Outcome::NotFound)
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::NotFound => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Completed(value) => Outcome::Completed(f(value)),
            Outcome::NotFound => Outcome::NotFound,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation`, classifying its errors with `classifier`
    pub async fn execute_classified<T, E, C, F, Fut>(
        &self,
        ctx: &RequestContext,
        classifier: &C,
        mut operation: F,
    ) -> Result<Outcome<T>, E>
    where
        C: Classify<E>,
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute(ctx, || {
            let attempt = operation();
            async move { attempt.await.map_err(|e| classifier.tag(e)) }
        })
        .await
    }

    /// Run `operation`, which tags its own errors
    pub async fn execute<T, E, F, Fut>(
        &self,
        ctx: &RequestContext,
        operation: F,
    ) -> Result<Outcome<T>, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClassifiedError<E>>>,
    {
        let span = ctx.span();
        self.run(ctx, operation).instrument(span).await
    }

    async fn run<T, E, F, Fut>(
        &self,
        ctx: &RequestContext,
        mut operation: F,
    ) -> Result<Outcome<T>, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClassifiedError<E>>>,
    {
        let start = Instant::now();
        let deadline = start
            .checked_add(self.policy.timeout)
            .unwrap_or_else(|| start + FAR_FUTURE);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let err = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(
                            log_id = %ctx.log_id(),
                            "{} succeeded after {} attempts",
                            ctx.operation(),
                            attempt
                        );
                    }
                    return Ok(Outcome::Completed(value));
                }
                Err(err) => err,
            };

            match err.kind() {
                Classification::NotFound => {
                    tracing::debug!(
                        log_id = %ctx.log_id(),
                        "{} target not found: {}",
                        ctx.operation(),
                        err
                    );
                    return Ok(Outcome::NotFound);
                }
                Classification::NonRetryable => {
                    tracing::error!(
                        log_id = %ctx.log_id(),
                        "{} non-retryable error: {}",
                        ctx.operation(),
                        err
                    );
                    return Err(err.into_inner());
                }
                Classification::Retryable => {
                    tracing::warn!(
                        log_id = %ctx.log_id(),
                        "{} retryable error (attempt {}): {}",
                        ctx.operation(),
                        attempt,
                        err
                    );
                }
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::error!(
                    log_id = %ctx.log_id(),
                    "{} gave up after {} attempts in {}ms",
                    ctx.operation(),
                    attempt,
                    self.policy.timeout.as_millis()
                );
                return Err(err.into_inner());
            }

            let backoff = self.policy.backoff.delay(attempt).min(deadline - now);
            tracing::debug!(
                log_id = %ctx.log_id(),
                "Retrying {} after {}ms (attempt {})",
                ctx.operation(),
                backoff.as_millis(),
                attempt + 1
            );
            tokio::time::sleep(backoff).await;

            if Instant::now() >= deadline {
                return Err(err.into_inner());
            }
        }
    }
}
