//! Response cache for successful GETs.

use crate::core::RequestKey;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug)]
struct CacheEntry {
    data: Arc<Value>,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) < ttl
    }
}

/// Keyed store of cached responses. Freshness is checked on every read; a stale entry
/// is a miss but stays in the map until the janitor sweeps it.
///
/// Writes are tagged with the generation read when the request started; a [`reset`]
/// in between turns them into no-ops.
///
/// [`reset`]: CacheStore::reset
#[derive(Debug, Default)]
pub(crate) struct CacheStore {
    map: RwLock<HashMap<RequestKey, CacheEntry>>,
    generation: AtomicU64,
}

impl CacheStore {
    pub(crate) async fn get(&self, key: &RequestKey, ttl: Duration) -> Option<Arc<Value>> {
        let guard = self.map.read().await;
        guard
            .get(key)
            .filter(|entry| entry.is_fresh(Instant::now(), ttl))
            .map(|entry| Arc::clone(&entry.data))
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Stores `data` unless the store was reset since `generation` was read.
    pub(crate) async fn set(&self, key: RequestKey, data: Arc<Value>, generation: u64) -> bool {
        let mut guard = self.map.write().await;
        if self.generation() != generation {
            return false;
        }
        let entry = CacheEntry {
            data,
            inserted_at: Instant::now(),
        };
        guard.insert(key, entry);
        true
    }

    /// Empties the store and invalidates every outstanding generation.
    pub(crate) async fn reset(&self) {
        let mut guard = self.map.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        guard.clear();
    }

    pub(crate) async fn delete(&self, key: &RequestKey) -> bool {
        self.map.write().await.remove(key).is_some()
    }

    /// Drops every entry whose age has reached `ttl`. Returns how many were removed.
    pub(crate) async fn sweep(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut guard = self.map.write().await;
        let before = guard.len();
        guard.retain(|_, entry| entry.is_fresh(now, ttl));
        before - guard.len()
    }

    /// Removes all entries, or only those whose key contains `pattern`.
    pub(crate) async fn clear_matching(&self, pattern: Option<&str>) -> usize {
        let mut guard = self.map.write().await;
        let before = guard.len();
        match pattern {
            Some(p) => guard.retain(|key, _| !key.as_str().contains(p)),
            None => guard.clear(),
        }
        before - guard.len()
    }

    /// `(valid, expired)` counts as of now.
    pub(crate) async fn counts(&self, ttl: Duration) -> (usize, usize) {
        let now = Instant::now();
        let guard = self.map.read().await;
        let valid = guard.values().filter(|e| e.is_fresh(now, ttl)).count();
        (valid, guard.len() - valid)
    }
}
