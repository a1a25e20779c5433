use serde::Deserialize;
use tfretry::ErrorCode;
use thiserror::Error;

/// Codes produced on the client side rather than returned by the API
pub mod client_codes {
    pub const NETWORK_ERROR: &str = "ClientError.NetworkError";
    pub const HTTP_STATUS_CODE_ERROR: &str = "ClientError.HttpStatusCodeError";
    pub const PARSE_JSON_ERROR: &str = "ClientError.ParseJsonError";
    pub const SIGN_ERROR: &str = "ClientError.SignError";
}

/// Error returned by a Tencent Cloud API call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[TencentCloudSDKError] Code={code}, Message={message}, RequestId={request_id}")]
pub struct SdkError {
    pub code: String,
    pub message: String,
    pub request_id: String,
}

impl SdkError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            request_id: request_id.into(),
        }
    }

    /// Error raised before a response envelope was available
    pub fn client(code: &str, message: impl Into<String>) -> Self {
        Self::new(code, message, "")
    }

    pub fn network(err: &reqwest::Error) -> Self {
        Self::client(client_codes::NETWORK_ERROR, err.to_string())
    }

    pub fn http_status(status: u16, body: &str) -> Self {
        Self::client(
            client_codes::HTTP_STATUS_CODE_ERROR,
            format!("HTTP {}: {}", status, body),
        )
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::client(client_codes::PARSE_JSON_ERROR, message)
    }

    /// Segment of the code before the first `.`
    pub fn short_code(&self) -> &str {
        self.code.split('.').next().unwrap_or(&self.code)
    }
}

impl ErrorCode for SdkError {
    fn code(&self) -> Option<&str> {
        if self.code.is_empty() {
            None
        } else {
            Some(&self.code)
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}

/// Error loading provider configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{0} is required (set in provider config or {1} env var)")]
    Missing(&'static str, &'static str),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error(transparent)]
    Policy(#[from] tfretry::PolicyError),
}
