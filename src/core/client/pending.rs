//! Registry of in-flight requests used to coalesce identical calls.

use crate::core::{AdError, RequestKey};
use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The settled outcome of one logical request, cloneable to every joined caller.
pub(crate) type SharedOutcome = Shared<BoxFuture<'static, Result<Arc<Value>, AdError>>>;

struct PendingEntry {
    id: u64,
    outcome: SharedOutcome,
}

/// A std mutex is used because the lock is never held across an await and must be
/// usable from [`PendingGuard`]'s `Drop`.
#[derive(Default)]
pub(crate) struct PendingRegistry {
    map: Mutex<HashMap<RequestKey, PendingEntry>>,
    next_id: AtomicU64,
}

impl fmt::Debug for PendingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRegistry")
            .field("in_flight", &self.len())
            .finish()
    }
}

impl PendingRegistry {
    fn lock(&self) -> MutexGuard<'_, HashMap<RequestKey, PendingEntry>> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn get(&self, key: &RequestKey) -> Option<SharedOutcome> {
        self.lock().get(key).map(|e| e.outcome.clone())
    }

    /// Returns the in-flight outcome for `key`, or registers the one produced by `start`.
    ///
    /// The lookup and the insert happen under a single lock, so two callers can never
    /// both start the same request. `start` receives the entry id to hand to a
    /// [`PendingGuard`]. The boolean is `true` when the caller joined an existing request.
    pub(crate) fn join_or_start(
        &self,
        key: &RequestKey,
        start: impl FnOnce(u64) -> SharedOutcome,
    ) -> (SharedOutcome, bool) {
        let mut guard = self.lock();
        if let Some(entry) = guard.get(key) {
            return (entry.outcome.clone(), true);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let outcome = start(id);
        guard.insert(
            key.clone(),
            PendingEntry {
                id,
                outcome: outcome.clone(),
            },
        );
        (outcome, false)
    }

    /// Removes the entry for `key` only if it is still the one registered under `id`.
    pub(crate) fn delete(&self, key: &RequestKey, id: u64) -> bool {
        let mut guard = self.lock();
        if guard.get(key).is_some_and(|e| e.id == id) {
            guard.remove(key);
            true
        } else {
            false
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn clear(&self) {
        self.lock().clear();
    }
}

/// Removes its registry entry when dropped, whether the request succeeded, failed or panicked.
#[derive(Debug)]
pub(crate) struct PendingGuard {
    registry: Arc<PendingRegistry>,
    key: RequestKey,
    id: u64,
}

impl PendingGuard {
    pub(crate) const fn new(registry: Arc<PendingRegistry>, key: RequestKey, id: u64) -> Self {
        Self { registry, key, id }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.registry.delete(&self.key, self.id);
    }
}
