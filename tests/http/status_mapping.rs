use adspace_rs::{AdClient, AdError, Backoff, RetryConfig};
use httpmock::Method::GET;
use httpmock::MockServer;
use std::time::Duration;
use url::Url;

fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        backoff: Backoff::Fixed(Duration::from_millis(1)), // Minimal delay for fast tests
        ..RetryConfig::default()
    }
}

#[tokio::test]
async fn persistent_503_is_retried_then_surfaced() {
    let server = MockServer::start();

    let fail_mock = server.mock(|when, then| {
        when.method(GET).path("/api/spaces");
        then.status(503).body("Service Unavailable");
    });

    let client = AdClient::builder()
        .base_url(Url::parse(&format!("{}/api", server.base_url())).unwrap())
        .retry_config(fast_retry(3))
        .build()
        .unwrap();

    let result = client.get("/spaces").await;

    // 1 initial attempt + 2 retries.
    fail_mock.assert_calls(3);
    match result {
        Err(AdError::Http { status, url }) => {
            assert_eq!(status, 503);
            assert!(url.ends_with("/api/spaces"));
        }
        other => panic!("expected Http 503, got {other:?}"),
    }
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/campaigns/404");
        then.status(404)
            .header("content-type", "application/json")
            .body(r#"{"error":"not found"}"#);
    });

    let client = AdClient::builder()
        .base_url(Url::parse(&format!("{}/api", server.base_url())).unwrap())
        .retry_config(fast_retry(3))
        .build()
        .unwrap();

    let err = client.get("/campaigns/404").await.unwrap_err();
    mock.assert_calls(1);
    assert_eq!(err.status(), Some(404));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn non_json_success_body_is_a_data_error() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/api/health");
        then.status(200).body("<html>ok</html>");
    });

    let client = AdClient::builder()
        .base_url(Url::parse(&format!("{}/api", server.base_url())).unwrap())
        .build()
        .unwrap();

    assert!(matches!(
        client.health().await.unwrap_err(),
        AdError::Data(_)
    ));
}
