//! Public client surface + builder.
//! Internals are split into `auth` (bearer tokens), `constants` (UA + defaults), `retry`
//! (policy types), the three stores (`cache`, `backoff`, `pending`), `executor` (one logical
//! request) and `janitor` (periodic sweeps).

mod auth;
mod backoff;
mod cache;
mod constants;
mod executor;
mod janitor;
mod pending;
mod retry;

pub use auth::{StaticToken, TokenProvider};
pub use retry::{Backoff, CacheMode, RetryConfig};

use crate::core::transport::{ReqwestTransport, Transport};
use crate::core::{AdError, CacheStats, Method, RequestKey};
use backoff::BackoffTracker;
use cache::CacheStore;
use constants::{
    BACKOFF_SWEEP_INTERVAL, CACHE_SWEEP_INTERVAL, DEFAULT_BASE_URL, DEFAULT_CACHE_TTL,
    DEFAULT_RETRY_AFTER, DEFAULT_TIMEOUT, RATE_LIMIT_JITTER, USER_AGENT,
};
use executor::{RequestDescriptor, RequestExecutor};
use futures::FutureExt;
use janitor::{Janitor, JanitorConfig, JanitorState};
use pending::{PendingGuard, PendingRegistry, SharedOutcome};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use url::Url;

/// Per-call overrides for [`AdClient::request_with`].
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Cache behavior for GETs. Ignored for other methods.
    pub cache_mode: CacheMode,
    /// Replaces the client's retry policy for this call.
    pub retry: Option<RetryConfig>,
}

impl RequestOptions {
    #[must_use]
    pub const fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    #[must_use]
    pub fn retry(mut self, cfg: RetryConfig) -> Self {
        self.retry = Some(cfg);
        self
    }
}

/// Marketplace API client with request coalescing, GET caching, rate-limit backoff and retry.
///
/// Cloning is cheap and every clone shares the same stores. The janitor stops when the
/// last clone is dropped or when [`AdClient::destroy`] is called.
///
/// # Example
///
/// ```no_run
/// # use adspace_rs::AdClient;
/// # #[tokio::main]
/// # async fn main() -> Result<(), adspace_rs::AdError> {
/// let client = AdClient::builder()
///     .base_url(url::Url::parse("https://api.example.com/api").unwrap())
///     .build()?;
///
/// let spaces = client.get("/spaces").await?;
/// println!("{spaces}");
/// client.destroy().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AdClient {
    executor: Arc<RequestExecutor>,
    retry: RetryConfig,
    cache_ttl: Duration,

    cache: Arc<CacheStore>,
    backoffs: Arc<BackoffTracker>,
    pending: Arc<PendingRegistry>,

    janitor_cfg: JanitorConfig,
    janitor: Arc<Mutex<JanitorState>>,
}

impl fmt::Debug for AdClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdClient")
            .field("base_url", &self.executor.base_url.as_str())
            .field("timeout", &self.executor.timeout)
            .field("cache_ttl", &self.cache_ttl)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl AdClient {
    /// Create a new builder.
    pub fn builder() -> AdClientBuilder {
        AdClientBuilder::default()
    }

    pub fn base_url(&self) -> &Url {
        &self.executor.base_url
    }

    /* -------- orchestrator -------- */

    /// Issues `method endpoint` with an optional JSON payload.
    ///
    /// In order: fail fast if the endpoint is in a rate-limit window; serve a fresh cached
    /// copy for GETs; join an identical request already in flight; otherwise start a new one.
    ///
    /// # Errors
    ///
    /// [`AdError::RateLimited`] from the local backoff window or a server `429`, and whatever
    /// the final attempt failed with once retries are exhausted.
    pub async fn request(
        &self,
        endpoint: &str,
        method: Method,
        payload: Option<Value>,
    ) -> Result<Value, AdError> {
        self.request_with(endpoint, method, payload, RequestOptions::default())
            .await
    }

    /// [`AdClient::request`] with per-call cache and retry overrides.
    ///
    /// # Errors
    ///
    /// See [`AdClient::request`].
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, payload, opts), err))]
    pub async fn request_with(
        &self,
        endpoint: &str,
        method: Method,
        payload: Option<Value>,
        opts: RequestOptions,
    ) -> Result<Value, AdError> {
        let shared = self.request_shared(endpoint, method, payload, opts).await?;
        Ok(Value::clone(&shared))
    }

    /// Like [`AdClient::request`] but decodes the response into `T`.
    ///
    /// # Errors
    ///
    /// See [`AdError`]; a body that does not match `T` is [`AdError::Data`].
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: Method,
        payload: Option<Value>,
    ) -> Result<T, AdError> {
        let shared = self
            .request_shared(endpoint, method, payload, RequestOptions::default())
            .await?;
        T::deserialize(shared.as_ref())
            .map_err(|e| AdError::Data(format!("unexpected shape for {endpoint}: {e}")))
    }

    async fn request_shared(
        &self,
        endpoint: &str,
        method: Method,
        payload: Option<Value>,
        opts: RequestOptions,
    ) -> Result<Arc<Value>, AdError> {
        self.ensure_janitor();
        let key = RequestKey::new(method, endpoint, payload.as_ref());

        if let Some(remaining) = self.backoffs.remaining(endpoint).await {
            log_debug!(endpoint, "endpoint backed off; failing fast");
            return Err(AdError::RateLimited {
                endpoint: endpoint.to_string(),
                retry_after: Some(remaining),
            });
        }

        let is_get = method == Method::Get;
        if is_get
            && opts.cache_mode == CacheMode::Use
            && let Some(hit) = self.cache.get(&key, self.cache_ttl).await
        {
            log_trace!(key = %key, "cache hit");
            return Ok(hit);
        }

        if let Some(in_flight) = self.pending.get(&key) {
            log_trace!(key = %key, "joining in-flight request");
            return in_flight.await;
        }

        let write_cache = is_get && opts.cache_mode != CacheMode::Bypass;
        let retry = opts.retry.unwrap_or_else(|| self.retry.clone());
        let desc = RequestDescriptor::new(endpoint, method, payload, retry.attempts());

        let (outcome, _joined) = self
            .pending
            .join_or_start(&key, |id| self.start(key.clone(), id, desc, retry, write_cache));
        outcome.await
    }

    /// Spawns the logical request so it runs to completion even if every caller stops
    /// waiting. The guard clears the pending entry after the cache write, on every path.
    fn start(
        &self,
        key: RequestKey,
        id: u64,
        desc: RequestDescriptor,
        retry: RetryConfig,
        write_cache: bool,
    ) -> SharedOutcome {
        let executor = Arc::clone(&self.executor);
        let cache = Arc::clone(&self.cache);
        let generation = cache.generation();
        let guard = PendingGuard::new(Arc::clone(&self.pending), key.clone(), id);

        let task = tokio::spawn(async move {
            let _guard = guard;
            let data = Arc::new(executor.execute(desc, &retry).await?);
            if write_cache && !cache.set(key, Arc::clone(&data), generation).await {
                log_debug!("client destroyed mid-request; response not cached");
            }
            Ok::<_, AdError>(data)
        });

        async move {
            task.await
                .map_err(|e| AdError::Network(format!("request task failed: {e}")))?
        }
        .boxed()
        .shared()
    }

    /* -------- convenience shorthands -------- */

    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn get(&self, endpoint: &str) -> Result<Value, AdError> {
        self.request(endpoint, Method::Get, None).await
    }

    /// GET decoded into `T`.
    ///
    /// # Errors
    ///
    /// See [`AdClient::request_json`].
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, AdError> {
        self.request_json(endpoint, Method::Get, None).await
    }

    /// # Errors
    ///
    /// See [`AdClient::request`]; a body that cannot be serialized is [`AdError::Data`].
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Value, AdError> {
        self.request(endpoint, Method::Post, Some(serde_json::to_value(body)?))
            .await
    }

    /// # Errors
    ///
    /// See [`AdClient::post`].
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Value, AdError> {
        self.request(endpoint, Method::Put, Some(serde_json::to_value(body)?))
            .await
    }

    /// # Errors
    ///
    /// See [`AdClient::post`].
    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Value, AdError> {
        self.request(endpoint, Method::Patch, Some(serde_json::to_value(body)?))
            .await
    }

    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn delete(&self, endpoint: &str) -> Result<Value, AdError> {
        self.request(endpoint, Method::Delete, None).await
    }

    /* -------- invalidation, stats, teardown -------- */

    /// Drops cached responses: all of them, or those whose key contains `pattern`.
    /// Returns how many entries were removed.
    pub async fn clear_cache(&self, pattern: Option<&str>) -> usize {
        self.cache.clear_matching(pattern).await
    }

    /// Drops the cached GET for exactly `endpoint`. Returns whether an entry existed.
    pub async fn invalidate(&self, endpoint: &str) -> bool {
        self.cache
            .delete(&RequestKey::new(Method::Get, endpoint, None))
            .await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        let (valid, expired) = self.cache.counts(self.cache_ttl).await;
        CacheStats {
            total: valid + expired,
            valid,
            expired,
            pending: self.pending.len(),
            backoffs: self.backoffs.active_count().await,
        }
    }

    /// Whether `endpoint` is currently inside a rate-limit window.
    pub async fn is_backed_off(&self, endpoint: &str) -> bool {
        self.backoffs.is_backed_off(endpoint).await
    }

    /// Time left in `endpoint`'s rate-limit window, if any.
    pub async fn backoff_remaining(&self, endpoint: &str) -> Option<Duration> {
        self.backoffs.remaining(endpoint).await
    }

    /// Stops the janitor and clears the cache, the backoff windows and the pending registry.
    ///
    /// Requests already in flight still settle for their callers, but their responses are
    /// not cached. Calling this twice is harmless.
    pub async fn destroy(&self) {
        let previous = std::mem::replace(&mut *self.lock_janitor(), JanitorState::Stopped);
        drop(previous);
        self.cache.reset().await;
        self.backoffs.clear().await;
        self.pending.clear();
        log_debug!("client destroyed");
    }

    fn lock_janitor(&self) -> std::sync::MutexGuard<'_, JanitorState> {
        self.janitor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_janitor(&self) {
        let mut state = self.lock_janitor();
        if matches!(*state, JanitorState::Idle)
            && let Some(j) = Janitor::start(
                Arc::downgrade(&self.cache),
                Arc::downgrade(&self.backoffs),
                self.janitor_cfg,
            )
        {
            *state = JanitorState::Running(j);
        }
    }

    #[cfg(test)]
    pub(crate) fn janitor_running(&self) -> bool {
        matches!(*self.lock_janitor(), JanitorState::Running(_))
    }
}

/* ----------------------- Builder ----------------------- */

#[derive(Default)]
pub struct AdClientBuilder {
    base_url: Option<Url>,
    user_agent: Option<String>,
    http: Option<reqwest::Client>,
    transport: Option<Arc<dyn Transport>>,
    token_provider: Option<Arc<dyn TokenProvider>>,

    timeout: Option<Duration>,
    cache_ttl: Option<Duration>,
    retry_config: Option<RetryConfig>,
    max_attempts: Option<u32>,
    retry_enabled: Option<bool>,
    rate_limit_jitter: Option<Duration>,
    default_retry_after: Option<Duration>,
    cache_sweep_interval: Option<Duration>,
    backoff_sweep_interval: Option<Duration>,
}

impl AdClientBuilder {
    /// API base; endpoints are appended verbatim (e.g. `https://host/api` + `/spaces`).
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Override the User-Agent of the built-in transport.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Use a preconfigured `reqwest::Client` (proxy, TLS, ...) for the built-in transport.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Replace the HTTP transport entirely.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Source of the bearer token, consulted once per attempt.
    pub fn token_provider(mut self, provider: impl TokenProvider + 'static) -> Self {
        self.token_provider = Some(Arc::new(provider));
        self
    }

    /// Per-attempt timeout. Default: 30 s.
    pub fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// How long a successful GET is served from memory. Default: 60 s.
    pub fn cache_ttl(mut self, dur: Duration) -> Self {
        self.cache_ttl = Some(dur);
        self
    }

    /// Full retry policy. `max_attempts` and `retry_enabled` are applied on top of it.
    pub fn retry_config(mut self, cfg: RetryConfig) -> Self {
        self.retry_config = Some(cfg);
        self
    }

    /// Total attempts per request, the first included. Default: 3.
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = Some(n);
        self
    }

    pub fn retry_enabled(mut self, enabled: bool) -> Self {
        self.retry_enabled = Some(enabled);
        self
    }

    /// Upper bound of the random offset added to every rate-limit window. Default: 5 s.
    pub fn rate_limit_jitter(mut self, dur: Duration) -> Self {
        self.rate_limit_jitter = Some(dur);
        self
    }

    /// Window used when a `429` has no usable `Retry-After`. Default: 60 s.
    pub fn default_retry_after(mut self, dur: Duration) -> Self {
        self.default_retry_after = Some(dur);
        self
    }

    /// Cadence of the cache sweep. Default: 5 min.
    pub fn cache_sweep_interval(mut self, dur: Duration) -> Self {
        self.cache_sweep_interval = Some(dur);
        self
    }

    /// Cadence of the backoff sweep. Default: 1 min.
    pub fn backoff_sweep_interval(mut self, dur: Duration) -> Self {
        self.backoff_sweep_interval = Some(dur);
        self
    }

    /// Builds the client. Inside a tokio runtime the janitor starts immediately; otherwise
    /// it starts with the first request.
    ///
    /// # Errors
    ///
    /// [`AdError::Config`] for a base URL that cannot take a path, or if the HTTP client
    /// cannot be constructed.
    pub fn build(self) -> Result<AdClient, AdError> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };
        if base_url.cannot_be_a_base() {
            return Err(AdError::Config(format!("base URL {base_url} cannot take a path")));
        }

        let transport: Arc<dyn Transport> = match (self.transport, self.http) {
            (Some(t), _) => t,
            (None, Some(http)) => Arc::new(ReqwestTransport::new(http)),
            (None, None) => Arc::new(ReqwestTransport::with_user_agent(
                self.user_agent.as_deref().unwrap_or(USER_AGENT),
            )?),
        };

        let mut retry = self.retry_config.unwrap_or_default();
        if let Some(n) = self.max_attempts {
            retry.max_attempts = n;
        }
        if let Some(enabled) = self.retry_enabled {
            retry.enabled = enabled;
        }

        let cache_ttl = self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL);
        let backoffs = Arc::new(BackoffTracker::new(
            self.rate_limit_jitter.unwrap_or(RATE_LIMIT_JITTER),
        ));

        let executor = RequestExecutor {
            transport,
            token_provider: self.token_provider,
            base_url,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            default_retry_after: self.default_retry_after.unwrap_or(DEFAULT_RETRY_AFTER),
            backoffs: Arc::clone(&backoffs),
        };

        let client = AdClient {
            executor: Arc::new(executor),
            retry,
            cache_ttl,
            cache: Arc::new(CacheStore::default()),
            backoffs,
            pending: Arc::new(PendingRegistry::default()),
            janitor_cfg: JanitorConfig {
                cache_ttl,
                cache_every: self.cache_sweep_interval.unwrap_or(CACHE_SWEEP_INTERVAL),
                backoff_every: self.backoff_sweep_interval.unwrap_or(BACKOFF_SWEEP_INTERVAL),
            },
            janitor: Arc::new(Mutex::new(JanitorState::Idle)),
        };
        client.ensure_janitor();
        Ok(client)
    }
}
