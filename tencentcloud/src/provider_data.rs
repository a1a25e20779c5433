//! Provider data structure passed to resources and data sources

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ConfigError;
use crate::locks::ProviderLocks;
use crate::retry::CloudRetry;
use std::sync::Arc;

#[derive(Clone)]
pub struct TencentCloudProviderData {
    pub client: Arc<ApiClient>,
    pub retry: CloudRetry,
    pub locks: ProviderLocks,
}

impl TencentCloudProviderData {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let retry = CloudRetry::new(config.timeouts);
        retry.read_policy().validate()?;
        retry.write_policy().validate()?;

        Ok(Self {
            client: Arc::new(ApiClient::new(config)?),
            retry,
            locks: ProviderLocks::new(),
        })
    }

    /// Configure from `TENCENTCLOUD_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(ClientConfig::from_env()?)
    }
}
