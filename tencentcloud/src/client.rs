use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tfretry::RequestContext;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{client_codes, ConfigError, ErrorBody, SdkError};
use crate::ratelimit::ActionRateLimiter;
use crate::sign::{self, SignInput, Tc3Signer};
use crate::stats::{CallRecorder, CallStats};

pub const INVALID_ENDPOINT: &str = "ClientError.InvalidEndpoint";

const MAX_IDLE_PER_HOST: usize = 10;
const IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

/// One API action invocation
#[derive(Debug, Clone, Copy)]
pub struct ApiRequest<'a, B> {
    pub service: &'a str,
    pub version: &'a str,
    pub action: &'a str,
    pub body: &'a B,
}

impl<'a, B> ApiRequest<'a, B> {
    pub fn new(service: &'a str, version: &'a str, action: &'a str, body: &'a B) -> Self {
        Self {
            service,
            version,
            action,
            body,
        }
    }
}

/// Tencent Cloud JSON API client
///
/// `call` performs exactly one attempt. Retrying is the caller's concern,
/// normally through [`crate::CloudRetry`].
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    config: ClientConfig,
    signer: Tc3Signer,
    rate_limiter: ActionRateLimiter,
    recorder: CallRecorder,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Response")]
    response: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ResponseMeta {
    #[serde(rename = "Error")]
    error: Option<ErrorBody>,
    #[serde(rename = "RequestId", default)]
    request_id: String,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let per_second = NonZeroU32::new(config.rate_limit).ok_or(ConfigError::InvalidValue {
            name: "rate_limit",
            value: config.rate_limit.to_string(),
        })?;

        let http_client = build_http_client(&config).map_err(|e| ConfigError::InvalidValue {
            name: "http_client",
            value: e.to_string(),
        })?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                signer: Tc3Signer::new(config.credential.clone()),
                rate_limiter: ActionRateLimiter::new(per_second),
                config,
                recorder: CallRecorder::new(),
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Attempts made so far, per action and error code
    pub async fn call_stats(&self) -> CallStats {
        self.inner.recorder.snapshot().await
    }

    /// Execute a single API action
    pub async fn call<B, T>(
        &self,
        ctx: &RequestContext,
        request: ApiRequest<'_, B>,
    ) -> Result<T, SdkError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = self
            .inner
            .config
            .service_url(request.service)
            .map_err(|e| SdkError::client(INVALID_ENDPOINT, e.to_string()))?;
        let host = host_header(&url)?;

        let payload = serde_json::to_vec(request.body)
            .map_err(|e| SdkError::parse(format!("Failed to encode request: {}", e)))?;

        self.inner.rate_limiter.acquire(request.action).await;

        let timestamp = chrono::Utc::now().timestamp();
        let authorization = self
            .inner
            .signer
            .authorization(&SignInput {
                service: request.service,
                host: &host,
                path: url.path(),
                payload: &payload,
                timestamp,
            })
            .map_err(|e| SdkError::client(client_codes::SIGN_ERROR, e))?;

        tracing::debug!(
            log_id = %ctx.log_id(),
            "POST {} action {} ({})",
            url,
            request.action,
            request.version
        );

        let mut builder = self
            .inner
            .http_client
            .post(url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, sign::CONTENT_TYPE)
            .header("X-TC-Action", request.action)
            .header("X-TC-Version", request.version)
            .header("X-TC-Timestamp", timestamp.to_string())
            .header("X-TC-Region", &self.inner.config.region);

        if let Some(token) = &self.inner.signer.credential().token {
            builder = builder.header("X-TC-Token", token);
        }

        let result = match builder.body(payload).send().await {
            Ok(response) => read_response(ctx, response).await,
            Err(e) => Err(SdkError::network(&e)),
        };

        let streak = self
            .inner
            .recorder
            .record(request.action, result.as_ref().map(|_| ()))
            .await;
        if let Err(err) = &result {
            tracing::debug!(
                log_id = %ctx.log_id(),
                "{} failed ({} in a row): {}",
                request.action,
                streak,
                err
            );
        }
        result
    }
}

async fn read_response<T: DeserializeOwned>(
    ctx: &RequestContext,
    response: reqwest::Response,
) -> Result<T, SdkError> {
    let status = response.status();
    let text = response.text().await.map_err(|e| SdkError::network(&e))?;

    if !status.is_success() {
        tracing::error!(log_id = %ctx.log_id(), "API error response: {}", text);
        return Err(SdkError::http_status(status.as_u16(), &text));
    }

    parse_response(&text)
}

fn build_http_client(config: &ClientConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(IDLE_TIMEOUT)
        .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
        .tcp_keepalive(TCP_KEEPALIVE)
        .build()
}

/// Host header value as sent by the HTTP client
fn host_header(url: &Url) -> Result<String, SdkError> {
    let host = url
        .host_str()
        .ok_or_else(|| SdkError::client(INVALID_ENDPOINT, format!("no host in {}", url)))?;

    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

fn parse_response<T: DeserializeOwned>(text: &str) -> Result<T, SdkError> {
    let envelope: Envelope = serde_json::from_str(text)
        .map_err(|e| SdkError::parse(format!("Failed to parse response: {}, body: {}", e, text)))?;

    let meta: ResponseMeta = serde_json::from_value(envelope.response.clone())
        .map_err(|e| SdkError::parse(format!("Failed to parse response: {}", e)))?;

    if let Some(error) = meta.error {
        return Err(SdkError::new(error.code, error.message, meta.request_id));
    }

    serde_json::from_value(envelope.response).map_err(|e| {
        SdkError::new(
            client_codes::PARSE_JSON_ERROR,
            format!("Failed to parse response: {}", e),
            meta.request_id,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct DescribeVpcsResponse {
        #[serde(rename = "TotalCount")]
        total_count: u64,
        #[serde(rename = "RequestId")]
        request_id: String,
    }

    fn client(url: &str) -> ApiClient {
        let config = ClientConfig::new("AKIDexample", "secret", "ap-guangzhou")
            .with_token("sts-token")
            .with_endpoint(url)
            .unwrap();
        ApiClient::new(config).unwrap()
    }

    fn describe_vpcs() -> ApiRequest<'static, serde_json::Value> {
        static BODY: std::sync::OnceLock<serde_json::Value> = std::sync::OnceLock::new();
        ApiRequest::new(
            "vpc",
            "2017-03-12",
            "DescribeVpcs",
            BODY.get_or_init(|| json!({"Limit": "20"})),
        )
    }

    #[tokio::test]
    async fn call_sends_signed_request_and_decodes_response() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeVpcs")
            .match_header("x-tc-version", "2017-03-12")
            .match_header("x-tc-region", "ap-guangzhou")
            .match_header("x-tc-token", "sts-token")
            .match_header(
                "authorization",
                Matcher::Regex(
                    r"^TC3-HMAC-SHA256 Credential=AKIDexample/\d{4}-\d{2}-\d{2}/vpc/tc3_request".into(),
                ),
            )
            .match_body(Matcher::Json(json!({"Limit": "20"})))
            .with_body(r#"{"Response":{"TotalCount":2,"VpcSet":[],"RequestId":"req-1"}}"#)
            .create_async()
            .await;

        let ctx = RequestContext::new("data_source_vpcs.read");
        let response: DescribeVpcsResponse =
            client(&server.url()).call(&ctx, describe_vpcs()).await.unwrap();

        assert_eq!(response.total_count, 2);
        assert_eq!(response.request_id, "req-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn call_maps_envelope_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body(
                r#"{"Response":{"Error":{"Code":"RequestLimitExceeded","Message":"too fast"},"RequestId":"req-2"}}"#,
            )
            .create_async()
            .await;

        let ctx = RequestContext::new("data_source_vpcs.read");
        let client = client(&server.url());
        let err = client
            .call::<_, DescribeVpcsResponse>(&ctx, describe_vpcs())
            .await
            .unwrap_err();

        assert_eq!(err, SdkError::new("RequestLimitExceeded", "too fast", "req-2"));

        let stats = client.call_stats().await;
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.failed_requests, 1);
        assert_eq!(stats.failures_with_code("RequestLimitExceeded"), 1);
        assert_eq!(stats.action("DescribeVpcs").unwrap().failure_streak, 1);
    }

    #[tokio::test]
    async fn call_signs_endpoint_path_prefix() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/gateway/")
            .match_header("x-tc-action", "DescribeVpcs")
            .with_body(r#"{"Response":{"TotalCount":0,"VpcSet":[],"RequestId":"req-3"}}"#)
            .create_async()
            .await;

        let endpoint = format!("{}/gateway/", server.url());
        let ctx = RequestContext::new("data_source_vpcs.read");
        let response: DescribeVpcsResponse =
            client(&endpoint).call(&ctx, describe_vpcs()).await.unwrap();

        assert_eq!(response.request_id, "req-3");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn call_maps_http_status_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let ctx = RequestContext::new("resource_vpc.create");
        let err = client(&server.url())
            .call::<_, DescribeVpcsResponse>(&ctx, describe_vpcs())
            .await
            .unwrap_err();

        assert_eq!(err.code, client_codes::HTTP_STATUS_CODE_ERROR);
        assert!(err.message.contains("502"));
    }

    #[tokio::test]
    async fn call_maps_unparseable_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let ctx = RequestContext::new("resource_vpc.read");
        let err = client(&server.url())
            .call::<_, DescribeVpcsResponse>(&ctx, describe_vpcs())
            .await
            .unwrap_err();

        assert_eq!(err.code, client_codes::PARSE_JSON_ERROR);
    }

    #[tokio::test]
    async fn call_maps_connection_failure_to_network_error() {
        let ctx = RequestContext::new("resource_vpc.read");
        let err = client("http://127.0.0.1:1")
            .call::<_, DescribeVpcsResponse>(&ctx, describe_vpcs())
            .await
            .unwrap_err();

        assert_eq!(err.code, client_codes::NETWORK_ERROR);
        assert!(err.request_id.is_empty());
    }

    #[test]
    fn host_header_keeps_explicit_port() {
        let url = Url::parse("http://127.0.0.1:8080/").unwrap();
        assert_eq!(host_header(&url).unwrap(), "127.0.0.1:8080");

        let url = Url::parse("https://cvm.tencentcloudapi.com/").unwrap();
        assert_eq!(host_header(&url).unwrap(), "cvm.tencentcloudapi.com");
    }

    #[test]
    fn parse_response_requires_envelope() {
        let err = parse_response::<serde_json::Value>(r#"{"TotalCount":1}"#).unwrap_err();
        assert_eq!(err.code, client_codes::PARSE_JSON_ERROR);

        let value: serde_json::Value =
            parse_response(r#"{"Response":{"RequestId":"r"}}"#).unwrap();
        assert_eq!(value["RequestId"], "r");
    }
}
