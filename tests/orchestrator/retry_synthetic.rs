use crate::common::{self, ScriptedTransport, Step, ok, status};
use adspace_rs::{AdError, Backoff, Method, RequestOptions, RetryConfig};
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn recovers_after_two_server_errors() {
    let transport = ScriptedTransport::new(vec![status(500), status(500), ok(r#"{"spaces":[]}"#)]);
    let client = common::client(&transport);

    let body = client.get("/spaces").await.unwrap();
    assert_eq!(body["spaces"], serde_json::json!([]));
    assert_eq!(transport.calls(), 3);

    let gaps = transport.gaps();
    assert_eq!(gaps.len(), 2);
    assert!(gaps[0] >= Duration::from_secs(2) && gaps[0] < Duration::from_secs(3));
    assert!(gaps[1] >= Duration::from_secs(4) && gaps[1] < Duration::from_secs(5));
    assert!(gaps[0] < gaps[1]);
}

#[tokio::test(start_paused = true)]
async fn persistent_5xx_surfaces_the_last_status() {
    let transport = ScriptedTransport::new(vec![status(503)]);
    let client = common::client(&transport);

    match client.get("/dashboard/stats").await {
        Err(AdError::Http { status, url }) => {
            assert_eq!(status, 503);
            assert_eq!(url, "http://marketplace.test/api/dashboard/stats");
        }
        other => panic!("expected Http 503, got {other:?}"),
    }
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn client_errors_are_not_retried() {
    for code in [400, 401, 403, 404, 409, 422] {
        let transport = ScriptedTransport::new(vec![status(code), ok("{}")]);
        let client = common::client(&transport);

        let err = client.get("/bookings/77").await.unwrap_err();
        assert_eq!(err.status(), Some(code));
        assert_eq!(transport.calls(), 1, "status {code} must not be retried");
    }
}

#[tokio::test(start_paused = true)]
async fn network_errors_are_retried() {
    let transport = ScriptedTransport::new(vec![
        Step::Fail(AdError::Network("connection reset".into())),
        ok("true"),
    ]);
    let client = common::client(&transport);

    assert_eq!(client.get("/health").await.unwrap(), serde_json::json!(true));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn every_attempt_times_out() {
    let transport = ScriptedTransport::new(vec![Step::Hang]);
    let client = common::client(&transport);
    let started = Instant::now();

    let err = client.get("/slow").await.unwrap_err();
    assert!(matches!(
        err,
        AdError::Timeout { after: Some(d) } if d == Duration::from_secs(30)
    ));
    assert_eq!(transport.calls(), 3);
    // Three 30 s attempts plus the 2 s and 4 s retry delays (and their jitter).
    assert!(started.elapsed() >= Duration::from_secs(96));
}

#[tokio::test(start_paused = true)]
async fn timeout_then_success() {
    let transport = ScriptedTransport::new(vec![Step::Hang, ok(r#"{"ok":1}"#)]);
    let client = common::builder(&transport)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    assert_eq!(client.get("/x").await.unwrap()["ok"], 1);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn disabled_retry_makes_a_single_attempt() {
    let transport = ScriptedTransport::new(vec![status(502), ok("{}")]);
    let client = common::builder(&transport)
        .retry_enabled(false)
        .build()
        .unwrap();

    assert_eq!(client.get("/x").await.unwrap_err().status(), Some(502));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn per_request_retry_override() {
    let transport = ScriptedTransport::new(vec![status(500)]);
    let client = common::client(&transport);
    let cfg = RetryConfig {
        max_attempts: 5,
        backoff: Backoff::Fixed(Duration::from_millis(10)),
        ..RetryConfig::default()
    };

    let err = client
        .request_with("/x", Method::Get, None, RequestOptions::default().retry(cfg))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(transport.calls(), 5);
    assert!(transport.gaps().iter().all(|g| *g == Duration::from_millis(10)));
}

#[tokio::test(start_paused = true)]
async fn connect_retries_can_be_switched_off() {
    let transport =
        ScriptedTransport::new(vec![Step::Fail(AdError::Network("refused".into())), ok("{}")]);
    let client = common::builder(&transport)
        .retry_config(RetryConfig {
            retry_on_connect: false,
            ..RetryConfig::default()
        })
        .build()
        .unwrap();

    assert!(matches!(
        client.get("/x").await.unwrap_err(),
        AdError::Network(_)
    ));
    assert_eq!(transport.calls(), 1);
}
