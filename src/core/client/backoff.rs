//! Per-endpoint rate-limit windows.

use super::constants::MAX_RETRY_AFTER;
use super::retry::random_jitter;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Maps an endpoint to the earliest instant it may be contacted again.
///
/// Keyed by endpoint alone: a `429` on one payload variant blocks every method and
/// payload sent to the same endpoint.
#[derive(Debug)]
pub(crate) struct BackoffTracker {
    map: RwLock<HashMap<String, Instant>>,
    jitter: Duration,
}

impl BackoffTracker {
    pub(crate) fn new(jitter: Duration) -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
            jitter,
        }
    }

    pub(crate) async fn is_backed_off(&self, endpoint: &str) -> bool {
        self.remaining(endpoint).await.is_some()
    }

    /// Time left in the endpoint's window, or `None` when it may be contacted.
    pub(crate) async fn remaining(&self, endpoint: &str) -> Option<Duration> {
        let until = *self.map.read().await.get(endpoint)?;
        let now = Instant::now();
        (now < until).then(|| until - now)
    }

    /// Opens (or replaces) the window for `endpoint`. The last `429` always wins, even if
    /// it shortens an earlier window. `retry_after` is capped at a day.
    pub(crate) async fn set_backoff(&self, endpoint: &str, retry_after: Duration) -> Instant {
        let window = retry_after
            .min(MAX_RETRY_AFTER)
            .saturating_add(random_jitter(self.jitter));
        let now = Instant::now();
        let until = now
            .checked_add(window)
            .unwrap_or_else(|| now + MAX_RETRY_AFTER);
        self.map.write().await.insert(endpoint.to_string(), until);
        until
    }

    /// Drops every window that has ended. Returns how many were removed.
    pub(crate) async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.map.write().await;
        let before = guard.len();
        guard.retain(|_, until| now < *until);
        before - guard.len()
    }

    pub(crate) async fn active_count(&self) -> usize {
        let now = Instant::now();
        self.map.read().await.values().filter(|u| now < **u).count()
    }

    pub(crate) async fn clear(&self) {
        self.map.write().await.clear();
    }
}
