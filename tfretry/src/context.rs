//! Request-scoped identifiers for lifecycle operations
//!
//! A [`RequestContext`] is created once per lifecycle call (create, read,
//! update, delete) and passed explicitly to every retry invocation made on
//! its behalf, so that all log lines of one call share a log id.

use std::sync::Arc;
use tokio::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct RequestContext {
    inner: Arc<ContextInner>,
}

#[derive(Debug)]
struct ContextInner {
    log_id: String,
    operation: String,
    started: Instant,
}

impl RequestContext {
    /// Create a context with a freshly generated log id
    pub fn new(operation: impl Into<String>) -> Self {
        Self::with_log_id(operation, uuid::Uuid::new_v4().to_string())
    }

    pub fn with_log_id(operation: impl Into<String>, log_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                log_id: log_id.into(),
                operation: operation.into(),
                started: Instant::now(),
            }),
        }
    }

    pub fn log_id(&self) -> &str {
        &self.inner.log_id
    }

    pub fn operation(&self) -> &str {
        &self.inner.operation
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.started.elapsed()
    }

    /// Span carrying the log id and operation name
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "operation",
            log_id = %self.inner.log_id,
            operation = %self.inner.operation
        )
    }

    /// Emit the time spent since the context was created
    pub fn log_elapsed(&self) {
        tracing::debug!(
            log_id = %self.inner.log_id,
            "{} elapsed {} ms",
            self.inner.operation,
            self.elapsed().as_millis()
        );
    }
}
