use crate::common::{self, ScriptedTransport, ok, rate_limited};
use adspace_rs::{AdError, Method};
use serde_json::json;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn rate_limit_fails_fast_until_window_ends() {
    let transport = ScriptedTransport::new(vec![rate_limited(Some("30")), ok(r#"{"id":12}"#)]);
    let client = common::client(&transport);
    let body = json!({"spaceId": 2});

    let err = client.post("/bookings", &body).await.unwrap_err();
    assert!(matches!(
        err,
        AdError::RateLimited { ref endpoint, retry_after: Some(d) }
            if endpoint == "/bookings" && d == Duration::from_secs(30)
    ));

    let err = client.post("/bookings", &body).await.unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(transport.calls(), 1);

    tokio::time::advance(Duration::from_secs(31)).await;
    assert_eq!(client.post("/bookings", &body).await.unwrap()["id"], 12);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_is_never_retried() {
    let transport = ScriptedTransport::new(vec![rate_limited(Some("5")), ok("{}")]);
    let client = common::builder(&transport).max_attempts(5).build().unwrap();

    assert!(client.get("/spaces").await.unwrap_err().is_rate_limited());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn window_covers_every_method_and_payload_of_the_endpoint() {
    let transport = ScriptedTransport::new(vec![ok("[]"), rate_limited(Some("10")), ok("{}")]);
    let client = common::client(&transport);

    client.get("/spaces").await.unwrap();
    assert!(
        client
            .post("/spaces", &json!({"title": "Bus shelter"}))
            .await
            .unwrap_err()
            .is_rate_limited()
    );

    // Backoff is checked before the cache, so even the cached GET is refused.
    assert!(client.get("/spaces").await.unwrap_err().is_rate_limited());
    assert!(
        client
            .request("/spaces", Method::Put, Some(json!({"x": 1})))
            .await
            .unwrap_err()
            .is_rate_limited()
    );
    assert_eq!(transport.calls(), 2);

    client.get("/campaigns").await.unwrap();
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn missing_or_invalid_retry_after_defaults_to_sixty_seconds() {
    for header in [None, Some("later")] {
        let transport = ScriptedTransport::new(vec![rate_limited(header)]);
        let client = common::client(&transport);

        let err = client.get("/dashboard").await.unwrap_err();
        assert!(matches!(
            err,
            AdError::RateLimited { retry_after: Some(d), .. } if d == Duration::from_secs(60)
        ));
        assert_eq!(
            client.backoff_remaining("/dashboard").await,
            Some(Duration::from_secs(60))
        );
    }
}

#[tokio::test(start_paused = true)]
async fn local_short_circuit_reports_time_left() {
    let transport = ScriptedTransport::new(vec![rate_limited(Some("30"))]);
    let client = common::client(&transport);

    client.get("/invoices").await.unwrap_err();
    tokio::time::advance(Duration::from_secs(10)).await;

    match client.get("/invoices").await {
        Err(AdError::RateLimited { retry_after, .. }) => {
            assert_eq!(retry_after, Some(Duration::from_secs(20)));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
    assert!(client.is_backed_off("/invoices").await);
}

#[tokio::test(start_paused = true)]
async fn jitter_extends_window_by_at_most_five_seconds() {
    let transport = ScriptedTransport::new(vec![rate_limited(Some("30"))]);
    let client = common::builder(&transport)
        .rate_limit_jitter(Duration::from_secs(5))
        .build()
        .unwrap();

    client.get("/x").await.unwrap_err();
    let left = client.backoff_remaining("/x").await.unwrap();
    assert!(left >= Duration::from_secs(30) && left < Duration::from_secs(35));

    tokio::time::advance(Duration::from_secs(35)).await;
    assert!(!client.is_backed_off("/x").await);
}

#[tokio::test(start_paused = true)]
async fn fresh_429_replaces_the_window() {
    let transport = ScriptedTransport::new(vec![
        rate_limited(Some("10")),
        rate_limited(Some("100")),
        ok("{}"),
    ]);
    let client = common::client(&transport);

    client.get("/x").await.unwrap_err();
    tokio::time::advance(Duration::from_secs(11)).await;
    client.get("/x").await.unwrap_err();
    assert_eq!(transport.calls(), 2);

    tokio::time::advance(Duration::from_secs(50)).await;
    assert!(client.get("/x").await.unwrap_err().is_rate_limited());
    assert_eq!(transport.calls(), 2);
    assert_eq!(client.cache_stats().await.backoffs, 1);
}

#[tokio::test(start_paused = true)]
async fn absurd_retry_after_is_capped_at_a_day() {
    let day = Duration::from_secs(24 * 60 * 60);
    let transport =
        ScriptedTransport::new(vec![rate_limited(Some("18446744073709551615")), ok("{}")]);
    let client = common::client(&transport);

    let err = client.get("/bookings").await.unwrap_err();
    assert!(matches!(
        err,
        AdError::RateLimited { retry_after: Some(d), .. } if d == day
    ));
    assert!(client.is_backed_off("/bookings").await);
    assert_eq!(client.backoff_remaining("/bookings").await, Some(day));

    tokio::time::advance(day).await;
    client.get("/bookings").await.unwrap();
    assert_eq!(transport.calls(), 2);
}
