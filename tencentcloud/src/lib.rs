//! Tencent Cloud glue for the tfretry executor
//!
//! Provides the SDK error model and its retry classification, a
//! single-attempt signed API client, and the [`CloudRetry`] helpers that
//! resource lifecycle functions wrap their API calls in.

pub mod client;
pub mod codes;
pub mod config;
pub mod error;
pub mod locks;
pub mod provider_data;
pub mod ratelimit;
pub mod retry;
pub mod sign;
pub mod stats;

pub use client::{ApiClient, ApiRequest};
pub use codes::{is_expect_error, retry_error, NOT_FOUND_ERROR_CODES, RETRYABLE_ERROR_CODES};
pub use config::{ClientConfig, Credential};
pub use error::{ConfigError, SdkError};
pub use locks::ProviderLocks;
pub use provider_data::TencentCloudProviderData;
pub use retry::CloudRetry;
pub use stats::{ActionStats, CallStats};
