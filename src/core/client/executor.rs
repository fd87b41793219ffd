//! One logical request: up to `max_attempts` physical attempts with classification and
//! retry scheduling between them.

use super::auth::{self, TokenProvider};
use super::backoff::BackoffTracker;
use super::constants::MAX_RETRY_AFTER;
use super::retry::RetryConfig;
use crate::core::transport::{Transport, TransportRequest, TransportResponse};
use crate::core::{AdError, Method};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A logical request as it moves through its attempts.
#[derive(Debug, Clone)]
pub(crate) struct RequestDescriptor {
    pub(crate) endpoint: String,
    pub(crate) method: Method,
    pub(crate) payload: Option<Value>,
    pub(crate) attempt: u32,
    pub(crate) max_attempts: u32,
}

impl RequestDescriptor {
    pub(crate) fn new(
        endpoint: &str,
        method: Method,
        payload: Option<Value>,
        max_attempts: u32,
    ) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            method,
            payload,
            attempt: 1,
            max_attempts: max_attempts.max(1),
        }
    }

    const fn has_attempts_left(&self) -> bool {
        self.attempt < self.max_attempts
    }
}

/// How a single attempt ended.
enum Verdict {
    Done(Result<Value, AdError>),
    Retry,
}

pub(crate) struct RequestExecutor {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) token_provider: Option<Arc<dyn TokenProvider>>,
    pub(crate) base_url: Url,
    pub(crate) timeout: Duration,
    pub(crate) default_retry_after: Duration,
    pub(crate) backoffs: Arc<BackoffTracker>,
}

impl RequestExecutor {
    /// Joins `endpoint` onto the base URL verbatim, so a base path like `/api` is kept.
    pub(crate) fn url_for(&self, endpoint: &str) -> Result<Url, AdError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let sep = if endpoint.starts_with('/') { "" } else { "/" };
        Ok(Url::parse(&format!("{base}{sep}{endpoint}"))?)
    }

    pub(crate) async fn execute(
        &self,
        mut desc: RequestDescriptor,
        retry: &RetryConfig,
    ) -> Result<Value, AdError> {
        let url = self.url_for(&desc.endpoint)?;
        let body = desc.payload.as_ref().map(serde_json::to_vec).transpose()?;

        loop {
            let outcome = self.attempt_once(desc.method, &url, body.clone()).await;
            match self.classify(&desc, &url, outcome, retry).await {
                Verdict::Done(result) => return result,
                Verdict::Retry => {
                    let delay = retry.backoff.delay(desc.attempt);
                    log_debug!(
                        endpoint = %desc.endpoint,
                        attempt = desc.attempt,
                        max_attempts = desc.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "retrying request"
                    );
                    tokio::time::sleep(delay).await;
                    desc.attempt += 1;
                }
            }
        }
    }

    async fn attempt_once(
        &self,
        method: Method,
        url: &Url,
        body: Option<Vec<u8>>,
    ) -> Result<TransportResponse, AdError> {
        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = auth::bearer(self.token_provider.as_deref()).await {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }

        let req = TransportRequest {
            method,
            url: url.clone(),
            headers,
            body,
        };

        // Elapsing drops the transport future, which cancels the attempt.
        tokio::time::timeout(self.timeout, self.transport.send(req))
            .await
            .unwrap_or(Err(AdError::Timeout {
                after: Some(self.timeout),
            }))
    }

    async fn classify(
        &self,
        desc: &RequestDescriptor,
        url: &Url,
        outcome: Result<TransportResponse, AdError>,
        retry: &RetryConfig,
    ) -> Verdict {
        let resp = match outcome {
            Ok(resp) => resp,
            Err(e) if desc.has_attempts_left() && retry.retries_error(&e) => return Verdict::Retry,
            Err(e) => return Verdict::Done(Err(e)),
        };

        if resp.is_success() {
            return Verdict::Done(decode_body(&resp));
        }

        match resp.status {
            429 => {
                let retry_after =
                    parse_retry_after(resp.header("retry-after")).unwrap_or(self.default_retry_after);
                self.backoffs.set_backoff(&desc.endpoint, retry_after).await;
                log_warn!(
                    endpoint = %desc.endpoint,
                    retry_after_s = retry_after.as_secs(),
                    "rate limited; endpoint backed off"
                );
                Verdict::Done(Err(AdError::RateLimited {
                    endpoint: desc.endpoint.clone(),
                    retry_after: Some(retry_after),
                }))
            }
            status if status >= 500 && desc.has_attempts_left() => Verdict::Retry,
            status => Verdict::Done(Err(AdError::Http {
                status,
                url: url.to_string(),
            })),
        }
    }
}

/// `Retry-After` in whole seconds, capped at a day. Anything else (absent, HTTP-date,
/// garbage) is `None`.
pub(crate) fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    let secs = value?.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}

/// An empty body (e.g. `204 No Content`) decodes to JSON `null`.
fn decode_body(resp: &TransportResponse) -> Result<Value, AdError> {
    if resp.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&resp.body)
        .map_err(|e| AdError::Data(format!("json parse error (status {}): {e}", resp.status)))
}
