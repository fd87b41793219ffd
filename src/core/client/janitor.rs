//! Periodic eviction of expired cache entries and ended backoff windows.
//!
//! Reads re-check freshness on their own, so the sweeps only bound memory. The tasks
//! hold weak references and exit once the client's stores are gone.

use super::backoff::BackoffTracker;
use super::cache::CacheStore;
use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy)]
pub(crate) struct JanitorConfig {
    pub(crate) cache_ttl: Duration,
    pub(crate) cache_every: Duration,
    pub(crate) backoff_every: Duration,
}

/// The two sweep tasks. Dropping the janitor aborts both.
#[derive(Debug)]
pub(crate) struct Janitor {
    cache_task: JoinHandle<()>,
    backoff_task: JoinHandle<()>,
}

impl Janitor {
    /// Spawns both sweeps on the current tokio runtime, or returns `None` outside one.
    pub(crate) fn start(
        cache: Weak<CacheStore>,
        backoffs: Weak<BackoffTracker>,
        cfg: JanitorConfig,
    ) -> Option<Self> {
        let handle = tokio::runtime::Handle::try_current().ok()?;

        let cache_task = handle.spawn(async move {
            let mut ticker = ticker(cfg.cache_every);
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else { break };
                let removed = cache.sweep(cfg.cache_ttl).await;
                if removed > 0 {
                    log_debug!(removed, "janitor evicted expired cache entries");
                }
            }
        });

        let backoff_task = handle.spawn(async move {
            let mut ticker = ticker(cfg.backoff_every);
            loop {
                ticker.tick().await;
                let Some(backoffs) = backoffs.upgrade() else { break };
                let removed = backoffs.sweep().await;
                if removed > 0 {
                    log_debug!(removed, "janitor cleared ended backoff windows");
                }
            }
        });

        Some(Self {
            cache_task,
            backoff_task,
        })
    }
}

impl Drop for Janitor {
    fn drop(&mut self) {
        self.cache_task.abort();
        self.backoff_task.abort();
    }
}

/// First tick one full period after start.
fn ticker(every: Duration) -> tokio::time::Interval {
    let every = every.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Lifecycle of the janitor owned by a client.
#[derive(Debug, Default)]
pub(crate) enum JanitorState {
    /// Not started yet (the client was built outside a runtime).
    #[default]
    Idle,
    Running(Janitor),
    /// Stopped by `destroy`; never restarted.
    Stopped,
}
