//! Provider configuration loaded from explicit values or environment variables

use crate::error::ConfigError;
use std::time::Duration;
use tfretry::{Timeouts, MAX_RETRY_TIMEOUT};
use url::Url;

pub const ENV_SECRET_ID: &str = "TENCENTCLOUD_SECRET_ID";
pub const ENV_SECRET_KEY: &str = "TENCENTCLOUD_SECRET_KEY";
pub const ENV_SECURITY_TOKEN: &str = "TENCENTCLOUD_SECURITY_TOKEN";
pub const ENV_REGION: &str = "TENCENTCLOUD_REGION";
pub const ENV_DOMAIN: &str = "TENCENTCLOUD_DOMAIN";
pub const ENV_PROTOCOL: &str = "TENCENTCLOUD_PROTOCOL";
pub const ENV_READ_RETRY_TIMEOUT: &str = "TENCENTCLOUD_READ_RETRY_TIMEOUT";
pub const ENV_WRITE_RETRY_TIMEOUT: &str = "TENCENTCLOUD_WRITE_RETRY_TIMEOUT";
pub const ENV_RATE_LIMIT: &str = "TENCENTCLOUD_RATE_LIMIT";

pub const DEFAULT_DOMAIN: &str = "tencentcloudapi.com";
pub const DEFAULT_PROTOCOL: &str = "https";
/// Requests per second allowed for a single API action
pub const DEFAULT_RATE_LIMIT: u32 = 20;

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub secret_id: String,
    pub secret_key: String,
    pub token: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"<redacted>")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credential: Credential,
    pub region: String,
    pub domain: String,
    pub protocol: String,
    /// Overrides `{protocol}://{service}.{domain}` for every service
    pub endpoint: Option<Url>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub rate_limit: u32,
    pub timeouts: Timeouts,
}

impl ClientConfig {
    pub fn new(
        secret_id: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            credential: Credential {
                secret_id: secret_id.into(),
                secret_key: secret_key.into(),
                token: None,
            },
            region: region.into(),
            domain: DEFAULT_DOMAIN.to_string(),
            protocol: DEFAULT_PROTOCOL.to_string(),
            endpoint: None,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            rate_limit: DEFAULT_RATE_LIMIT,
            timeouts: Timeouts::default(),
        }
    }

    /// Load configuration from `TENCENTCLOUD_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret_id =
            env_string(ENV_SECRET_ID).ok_or(ConfigError::Missing("secret_id", ENV_SECRET_ID))?;
        let secret_key =
            env_string(ENV_SECRET_KEY).ok_or(ConfigError::Missing("secret_key", ENV_SECRET_KEY))?;
        let region = env_string(ENV_REGION).ok_or(ConfigError::Missing("region", ENV_REGION))?;

        let mut config = Self::new(secret_id, secret_key, region);
        config.credential.token = env_string(ENV_SECURITY_TOKEN);

        if let Some(domain) = env_string(ENV_DOMAIN) {
            config.domain = domain;
        }
        if let Some(protocol) = env_string(ENV_PROTOCOL) {
            config = config.with_protocol(&protocol)?;
        }
        if let Some(limit) = env_parse::<u32>(ENV_RATE_LIMIT)? {
            config = config.with_rate_limit(limit)?;
        }
        config.timeouts = timeouts_from_env()?;

        Ok(config)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.credential.token = Some(token.into());
        self
    }

    pub fn with_protocol(mut self, protocol: &str) -> Result<Self, ConfigError> {
        let protocol = protocol.to_ascii_lowercase();
        if protocol != "https" && protocol != "http" {
            return Err(ConfigError::InvalidValue {
                name: "protocol",
                value: protocol,
            });
        }
        self.protocol = protocol;
        Ok(self)
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(endpoint).map_err(|e| ConfigError::InvalidEndpoint(e.to_string()))?;
        if url.host_str().is_none() {
            return Err(ConfigError::InvalidEndpoint(endpoint.to_string()));
        }
        self.endpoint = Some(url);
        Ok(self)
    }

    pub fn with_rate_limit(mut self, per_second: u32) -> Result<Self, ConfigError> {
        if per_second == 0 {
            return Err(ConfigError::InvalidValue {
                name: "rate_limit",
                value: per_second.to_string(),
            });
        }
        self.rate_limit = per_second;
        Ok(self)
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// URL that requests for `service` are sent to
    pub fn service_url(&self, service: &str) -> Result<Url, ConfigError> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }

        let raw = format!("{}://{}.{}/", self.protocol, service, self.domain);
        Url::parse(&raw).map_err(|e| ConfigError::InvalidEndpoint(format!("{}: {}", raw, e)))
    }
}

/// Read and write budgets, overridable in seconds through the environment
pub fn timeouts_from_env() -> Result<Timeouts, ConfigError> {
    let mut timeouts = Timeouts::default();

    if let Some(secs) = env_parse::<u64>(ENV_READ_RETRY_TIMEOUT)? {
        timeouts.read = positive_secs(ENV_READ_RETRY_TIMEOUT, secs)?;
    }
    if let Some(secs) = env_parse::<u64>(ENV_WRITE_RETRY_TIMEOUT)? {
        timeouts.write = positive_secs(ENV_WRITE_RETRY_TIMEOUT, secs)?;
    }

    Ok(timeouts)
}

fn positive_secs(name: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 || secs > MAX_RETRY_TIMEOUT.as_secs() {
        return Err(ConfigError::InvalidValue {
            name,
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env_string(name) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(_) => Err(ConfigError::InvalidValue { name, value: raw }),
        },
        None => Ok(None),
    }
}
