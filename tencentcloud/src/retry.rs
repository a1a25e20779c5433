//! Read, write and destroy-check helpers bound to Tencent Cloud classification
//!
//! Lifecycle code does not build executors itself. It asks [`CloudRetry`]
//! for the budget tier matching the call and hands over one attempt:
//!
//! ```ignore
//! let instance = retry
//!     .read(&ctx, || client.call(&ctx, describe_instance(&id)))
//!     .await?;
//! ```

use crate::codes;
use crate::error::SdkError;
use std::future::Future;
use tfretry::{
    Backoff, ClassifiedError, Classify, Outcome, RequestContext, RetryExecutor, RetryPolicy,
    Timeouts,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudRetry {
    timeouts: Timeouts,
    backoff: Backoff,
}

impl Default for CloudRetry {
    fn default() -> Self {
        Self::new(Timeouts::default())
    }
}

impl CloudRetry {
    pub fn new(timeouts: Timeouts) -> Self {
        Self {
            timeouts,
            backoff: Backoff::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    pub fn read_policy(&self) -> RetryPolicy {
        RetryPolicy::read(&self.timeouts).with_backoff(self.backoff)
    }

    pub fn write_policy(&self) -> RetryPolicy {
        RetryPolicy::write(&self.timeouts).with_backoff(self.backoff)
    }

    /// Query within the read budget; `None` when the resource does not exist
    pub async fn read<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        operation: F,
    ) -> Result<Option<T>, SdkError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SdkError>>,
    {
        let outcome = RetryExecutor::new(self.read_policy())
            .execute_classified(ctx, &codes::not_found_classifier(), operation)
            .await?;

        if outcome.is_not_found() {
            tracing::warn!(
                log_id = %ctx.log_id(),
                "{} resource not found, treating as absent",
                ctx.operation()
            );
        }
        Ok(outcome.into_option())
    }

    /// Mutate within the write budget
    pub async fn write<T, F, Fut>(&self, ctx: &RequestContext, operation: F) -> Result<T, SdkError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SdkError>>,
    {
        self.write_with(ctx, &[], &[], operation).await
    }

    /// Mutate within the write budget with per-call code lists
    ///
    /// `additional` codes are retried on top of the defaults. `stop` codes end
    /// the call after the attempt that returned them, even when their short
    /// code is retryable by default.
    pub async fn write_with<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        additional: &[&str],
        stop: &[&str],
        operation: F,
    ) -> Result<T, SdkError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SdkError>>,
    {
        let classifier = codes::classifier(additional, stop);
        let outcome = RetryExecutor::new(self.write_policy())
            .execute_classified(ctx, &classifier, operation)
            .await?;

        match outcome {
            Outcome::Completed(value) => Ok(value),
            // codes::classifier registers no not-found codes and falls back
            // to NonRetryable, so it never tags an error NotFound
            Outcome::NotFound => unreachable!("write classifier reported not found"),
        }
    }

    /// One verification that a deleted resource is gone
    ///
    /// Returns `Ok(true)` when the query reports a not-found code and
    /// `Ok(false)` when the resource can still be described.
    pub async fn destroy_check<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        operation: F,
    ) -> Result<bool, SdkError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SdkError>>,
    {
        let outcome = RetryExecutor::new(self.read_policy())
            .execute_classified(ctx, &codes::not_found_classifier(), operation)
            .await?;

        Ok(outcome.is_not_found())
    }

    /// Poll `describe` within the write budget until the resource is gone
    ///
    /// `describe` yields `Some` while the resource still exists. Transient
    /// errors are retried like any other call.
    pub async fn wait_deleted<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        mut describe: F,
    ) -> Result<(), SdkError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, SdkError>>,
    {
        let classifier = codes::not_found_classifier();
        RetryExecutor::new(self.write_policy())
            .execute(ctx, || {
                let attempt = describe();
                let classifier = &classifier;
                async move {
                    match attempt.await {
                        Ok(None) => Ok(()),
                        Ok(Some(_)) => Err(ClassifiedError::retryable(SdkError::client(
                            "ResourceInUse",
                            format!("{} resource still exists", ctx.operation()),
                        ))),
                        Err(e) => Err(classifier.tag(e)),
                    }
                }
            })
            .await?;

        Ok(())
    }
}
