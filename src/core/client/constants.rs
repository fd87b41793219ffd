//! Centralized constants for default endpoints, UA and resilience timings.

use std::time::Duration;

/// Default UA sent by the built-in transport.
pub(crate) const USER_AGENT: &str = concat!("adspace-rs/", env!("CARGO_PKG_VERSION"));

/// Marketplace API base (endpoints are appended verbatim).
pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:3001/api";

/// Hard per-attempt timeout.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum age at which a cached GET response is still served.
pub(crate) const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Initial attempt plus two retries.
pub(crate) const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Retry delay is `RETRY_BASE * 2^attempt` plus up to `RETRY_JITTER`.
pub(crate) const RETRY_BASE: Duration = Duration::from_secs(1);
pub(crate) const RETRY_JITTER: Duration = Duration::from_secs(1);
pub(crate) const RETRY_MAX: Duration = Duration::from_secs(60);

/// Window applied when a `429` carries no usable `Retry-After`.
pub(crate) const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Longest rate-limit window a server's `Retry-After` can open.
pub(crate) const MAX_RETRY_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

/// Upper bound of the random offset added to every rate-limit window.
pub(crate) const RATE_LIMIT_JITTER: Duration = Duration::from_secs(5);

/// Janitor cadence.
pub(crate) const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub(crate) const BACKOFF_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
