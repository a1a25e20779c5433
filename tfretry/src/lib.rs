//! tfretry - bounded retries for Terraform provider lifecycle operations
//!
//! Every create, read, update and delete of a provider resource performs its
//! remote calls through [`RetryExecutor`]: one closure per attempt, a
//! wall-clock budget per call site, and a [`Classify`] predicate deciding
//! which failures are worth another attempt.

pub mod classify;
pub mod context;
pub mod error;
pub mod executor;
pub mod lock;
pub mod policy;

pub use classify::{
    code_matches, Classification, ClassifiedError, Classify, CodeClassifier, ErrorCode,
};
pub use context::RequestContext;
pub use error::{PolicyError, Result};
pub use executor::{Outcome, RetryExecutor};
pub use lock::{LockRegistry, ResourceLock, ResourceLockGuard};
pub use policy::{
    Backoff, OperationKind, RetryPolicy, Timeouts, MAX_RETRY_TIMEOUT, READ_RETRY_TIMEOUT,
    WRITE_RETRY_TIMEOUT,
};
