use super::constants::{DEFAULT_MAX_ATTEMPTS, RETRY_BASE, RETRY_JITTER, RETRY_MAX};
use crate::core::AdError;
use std::time::Duration;

/// Specifies the backoff strategy for retrying failed requests.
#[derive(Clone, Debug, PartialEq)]
pub enum Backoff {
    /// Uses a fixed delay between retries.
    Fixed(Duration),
    /// Uses an exponential delay between retries.
    /// The delay is calculated as `base * (factor ^ attempt) + random(0, jitter)`.
    Exponential {
        /// The backoff unit.
        base: Duration,
        /// The multiplicative factor for each subsequent retry.
        factor: f64,
        /// Cap on the exponential part of the delay.
        max: Duration,
        /// Upper bound of the random offset, drawn independently per attempt.
        jitter: Duration,
    },
}

impl Backoff {
    /// Delay to wait after the failed attempt numbered `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(d) => *d,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
                let secs = (base.as_secs_f64() * factor.powi(exp)).max(0.0);
                let scaled = if secs.is_finite() && secs < max.as_secs_f64() {
                    Duration::from_secs_f64(secs)
                } else {
                    *max
                };
                scaled + random_jitter(*jitter)
            }
        }
    }
}

/// Uniform offset in `[0, bound)`.
pub(crate) fn random_jitter(bound: Duration) -> Duration {
    let nanos = u64::try_from(bound.as_nanos()).unwrap_or(u64::MAX);
    if nanos == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(fastrand::u64(0..nanos))
}

/// Configuration for the automatic retry mechanism.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    /// Enables or disables the retry mechanism. When disabled every request gets exactly one attempt.
    pub enabled: bool,
    /// Total attempts per logical request, the initial one included.
    pub max_attempts: u32,
    /// The backoff strategy to use between retries.
    pub backoff: Backoff,
    /// Whether to retry when an attempt exceeds the timeout.
    pub retry_on_timeout: bool,
    /// Whether to retry on transport errors (connection refused, reset, ...).
    pub retry_on_connect: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::Exponential {
                base: RETRY_BASE,
                factor: 2.0,
                max: RETRY_MAX,
                jitter: RETRY_JITTER,
            },
            retry_on_timeout: true,
            retry_on_connect: true,
        }
    }
}

impl RetryConfig {
    /// Effective number of attempts, never less than one.
    pub fn attempts(&self) -> u32 {
        if self.enabled {
            self.max_attempts.max(1)
        } else {
            1
        }
    }

    /// Whether a transport-level failure may be retried. Status-based decisions live in the executor.
    pub(crate) const fn retries_error(&self, err: &AdError) -> bool {
        match err {
            AdError::Timeout { .. } => self.retry_on_timeout,
            AdError::Network(_) => self.retry_on_connect,
            _ => false,
        }
    }
}

/// Defines the behavior of the in-memory cache for a GET call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Read from the cache if a non-expired entry is present; otherwise, fetch from the network
    /// and write the response to the cache. (Default)
    #[default]
    Use,
    /// Always fetch from the network, bypassing any cached entry, and write the new response to the cache.
    Refresh,
    /// Always fetch from the network and do not read from or write to the cache.
    Bypass,
}
