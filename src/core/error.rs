use std::time::Duration;
use thiserror::Error;

/// The primary error type for all fallible operations in this crate.
///
/// `AdError` is `Clone` because a single settled request outcome is handed to every
/// caller that joined the same in-flight request.
#[derive(Debug, Clone, Error)]
pub enum AdError {
    /// The endpoint is inside a rate-limit backoff window, either because the server
    /// answered `429` just now or because an earlier `429` is still in force.
    #[error("rate limited on {endpoint}")]
    RateLimited {
        /// The endpoint path the backoff applies to.
        endpoint: String,
        /// How long the caller should wait, when known.
        retry_after: Option<Duration>,
    },

    /// The server returned an unsuccessful HTTP status and no further retry applies.
    #[error("Unexpected response status: {status} at {url}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
    },

    /// A transport-level failure (connection refused, reset, DNS, TLS, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// A single attempt exceeded the configured timeout.
    #[error("request timed out")]
    Timeout {
        /// The timeout that elapsed, when the client enforced it.
        after: Option<Duration>,
    },

    /// A provided URL or endpoint could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The response body was not valid JSON or did not match the requested type.
    #[error("Data format unexpected: {0}")]
    Data(String),

    /// The client was built with an unusable configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The token provider failed. Requests never surface this; they proceed unauthenticated.
    #[error("auth token unavailable: {0}")]
    Auth(String),
}

impl AdError {
    /// Returns `true` for both the local backoff short-circuit and a server `429`.
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// The HTTP status carried by this error, if any.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Whether the failure is transient in nature (timeouts, transport errors, 5xx).
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AdError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout { after: None }
        } else if e.is_builder() {
            Self::Config(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AdError {
    fn from(e: serde_json::Error) -> Self {
        Self::Data(format!("json error: {e}"))
    }
}
