//! Resource lifecycle calls against a mock Tencent Cloud API

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use mockito::{Matcher, Server, ServerGuard};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tencentcloud::{
    ApiClient, ApiRequest, ClientConfig, CloudRetry, ProviderLocks, SdkError,
    TencentCloudProviderData,
};
use tfretry::{Backoff, RequestContext, Timeouts};

#[derive(Debug, Deserialize)]
struct CreateListenerResponse {
    #[serde(rename = "ListenerIds")]
    listener_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DescribeListenersResponse {
    #[serde(rename = "TotalCount")]
    total_count: u64,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn provider(server: &ServerGuard) -> TencentCloudProviderData {
    let config = ClientConfig::new("AKIDexample", "secret", "ap-guangzhou")
        .with_endpoint(&server.url())
        .unwrap()
        .with_timeouts(Timeouts {
            read: Duration::from_secs(2),
            write: Duration::from_secs(3),
        });

    let mut data = TencentCloudProviderData::new(config).unwrap();
    data.retry = data
        .retry
        .with_backoff(Backoff::Fixed(Duration::from_millis(20)));
    data
}

fn error_body(code: &str) -> String {
    json!({
        "Response": {
            "Error": {"Code": code, "Message": "test error"},
            "RequestId": "req-error"
        }
    })
    .to_string()
}

async fn create_listener(
    client: &ApiClient,
    retry: &CloudRetry,
    locks: &ProviderLocks,
    ctx: &RequestContext,
) -> Result<String, SdkError> {
    let body = json!({"LoadBalancerId": "lb-1", "Ports": [80], "Protocol": "HTTP"});
    let _guard = locks.clb_listener.acquire().await;

    let response: CreateListenerResponse = retry
        .write(ctx, || {
            client.call(
                ctx,
                ApiRequest::new("clb", "2018-03-17", "CreateListener", &body),
            )
        })
        .await?;

    Ok(response.listener_ids.into_iter().next().unwrap_or_default())
}

#[tokio::test(flavor = "multi_thread")]
async fn create_retries_rate_limit_then_succeeds() {
    init_tracing();
    let mut server = Server::new_async().await;

    let throttled = server
        .mock("POST", "/")
        .match_header("x-tc-action", "CreateListener")
        .with_body(error_body("RequestLimitExceeded"))
        .expect(2)
        .create_async()
        .await;
    let created = server
        .mock("POST", "/")
        .match_header("x-tc-action", "CreateListener")
        .with_body(r#"{"Response":{"ListenerIds":["lbl-1"],"RequestId":"req-ok"}}"#)
        .expect(1)
        .create_async()
        .await;

    let data = provider(&server);
    let ctx = RequestContext::new("resource_clb_listener.create");

    let id = create_listener(&data.client, &data.retry, &data.locks, &ctx)
        .await
        .unwrap();

    assert_eq!(id, "lbl-1");
    throttled.assert_async().await;
    created.assert_async().await;

    let stats = data.client.call_stats().await;
    assert_eq!(stats.total_requests, 3);
    assert_eq!(stats.failed_requests, 2);
    let create = stats.action("CreateListener").unwrap();
    assert_eq!(create.failures_by_code["RequestLimitExceeded"], 2);
    assert_eq!(create.failure_streak, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn create_stops_on_invalid_parameter() {
    init_tracing();
    let mut server = Server::new_async().await;

    let rejected = server
        .mock("POST", "/")
        .with_body(error_body("InvalidParameter.FormatError"))
        .expect(1)
        .create_async()
        .await;

    let data = provider(&server);
    let ctx = RequestContext::new("resource_clb_listener.create");

    let err = create_listener(&data.client, &data.retry, &data.locks, &ctx)
        .await
        .unwrap_err();

    assert_eq!(err.code, "InvalidParameter.FormatError");
    assert_eq!(err.request_id, "req-error");
    rejected.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn create_stops_on_caller_stop_code() {
    init_tracing();
    let mut server = Server::new_async().await;

    let taken = server
        .mock("POST", "/")
        .match_header("x-tc-action", "CreateLoadBalancer")
        .with_body(error_body("ResourceInUse.NameExists"))
        .expect(1)
        .create_async()
        .await;

    let data = provider(&server);
    let ctx = RequestContext::new("resource_clb_instance.create");
    let body = json!({"LoadBalancerName": "web", "LoadBalancerType": "OPEN"});

    let err = data
        .retry
        .write_with(&ctx, &[], &["ResourceInUse.NameExists"], || {
            data.client.call::<_, serde_json::Value>(
                &ctx,
                ApiRequest::new("clb", "2018-03-17", "CreateLoadBalancer", &body),
            )
        })
        .await
        .unwrap_err();

    assert_eq!(err.code, "ResourceInUse.NameExists");
    taken.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn persistent_server_errors_exhaust_write_budget() {
    init_tracing();
    let mut server = Server::new_async().await;

    let _unavailable = server
        .mock("POST", "/")
        .with_status(503)
        .with_body("service unavailable")
        .expect_at_least(2)
        .create_async()
        .await;

    let data = provider(&server);
    let ctx = RequestContext::new("resource_clb_listener.create");
    let start = std::time::Instant::now();

    let err = create_listener(&data.client, &data.retry, &data.locks, &ctx)
        .await
        .unwrap_err();

    assert_eq!(err.code, "ClientError.HttpStatusCodeError");
    assert!(start.elapsed() >= Duration::from_secs(3));
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_then_destroy_check_confirms_absence() {
    init_tracing();
    let mut server = Server::new_async().await;

    let _delete = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DeleteListener")
        .with_body(r#"{"Response":{"RequestId":"req-del"}}"#)
        .create_async()
        .await;
    let _still_listed = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DescribeListeners")
        .with_body(r#"{"Response":{"TotalCount":1,"Listeners":[{}],"RequestId":"r1"}}"#)
        .expect(1)
        .create_async()
        .await;
    let _gone = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DescribeListeners")
        .match_body(Matcher::PartialJson(json!({"ListenerIds": ["lbl-1"]})))
        .with_body(error_body("InvalidParameter.NotFound"))
        .create_async()
        .await;

    let data = provider(&server);
    let ctx = RequestContext::new("resource_clb_listener.delete");
    let delete = json!({"LoadBalancerId": "lb-1", "ListenerId": "lbl-1"});
    let describe = json!({"LoadBalancerId": "lb-1", "ListenerIds": ["lbl-1"]});

    {
        let _guard = data.locks.clb_listener.acquire().await;
        let _: serde_json::Value = data
            .retry
            .write(&ctx, || {
                data.client.call(
                    &ctx,
                    ApiRequest::new("clb", "2018-03-17", "DeleteListener", &delete),
                )
            })
            .await
            .unwrap();
    }

    let describe_once = || {
        data.client.call::<_, DescribeListenersResponse>(
            &ctx,
            ApiRequest::new("clb", "2018-03-17", "DescribeListeners", &describe),
        )
    };

    let gone = data.retry.destroy_check(&ctx, describe_once).await.unwrap();
    assert!(!gone, "first describe still lists the listener");

    let gone = data.retry.destroy_check(&ctx, describe_once).await.unwrap();
    assert!(gone);
    ctx.log_elapsed();
}

#[tokio::test(flavor = "multi_thread")]
async fn read_of_missing_resource_returns_none() {
    init_tracing();
    let mut server = Server::new_async().await;

    let _missing = server
        .mock("POST", "/")
        .with_body(error_body("ResourceNotFound"))
        .create_async()
        .await;

    let data = provider(&server);
    let ctx = RequestContext::new("resource_clb_listener.read");
    let describe = json!({"ListenerIds": ["lbl-404"]});

    let found = data
        .retry
        .read(&ctx, || {
            data.client.call::<_, DescribeListenersResponse>(
                &ctx,
                ApiRequest::new("clb", "2018-03-17", "DescribeListeners", &describe),
            )
        })
        .await
        .unwrap();

    assert!(found.is_none());
    assert!(found.map(|r| r.total_count).is_none());
}
