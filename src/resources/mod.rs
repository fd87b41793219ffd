//! Thin per-resource wrappers over [`AdClient::request_with`].
//!
//! Each handle only picks the endpoint, method and payload; caching, coalescing, backoff
//! and retry all happen in the client. Mutations drop the cached GETs of their resource
//! so the next list reflects the change.

mod bookings;
mod campaigns;
mod messages;
mod spaces;

pub use bookings::Bookings;
pub use campaigns::Campaigns;
pub use messages::Messages;
pub use spaces::Spaces;

use crate::core::{AdClient, AdError, CacheMode, Method, RequestOptions, RetryConfig};
use serde::Serialize;
use serde_json::Value;

/// Client plus per-handle options, shared by every resource handle.
#[derive(Debug, Clone)]
pub(crate) struct Scope {
    client: AdClient,
    opts: RequestOptions,
}

impl Scope {
    fn new(client: &AdClient) -> Self {
        Self {
            client: client.clone(),
            opts: RequestOptions::default(),
        }
    }

    async fn call(
        &self,
        endpoint: &str,
        method: Method,
        payload: Option<Value>,
    ) -> Result<Value, AdError> {
        self.client
            .request_with(endpoint, method, payload, self.opts.clone())
            .await
    }

    async fn read(&self, endpoint: &str) -> Result<Value, AdError> {
        self.call(endpoint, Method::Get, None).await
    }

    /// Sends a mutation, then drops cached GETs under `collection`.
    async fn write<B: Serialize + ?Sized>(
        &self,
        collection: &str,
        endpoint: &str,
        method: Method,
        body: Option<&B>,
    ) -> Result<Value, AdError> {
        let payload = body.map(serde_json::to_value).transpose()?;
        let out = self.call(endpoint, method, payload).await?;
        self.client
            .clear_cache(Some(&format!("{}:{collection}", Method::Get)))
            .await;
        Ok(out)
    }
}

/// Builder-style options shared by every resource handle.
macro_rules! scoped_options {
    ($ty:ty) => {
        impl $ty {
            /// Sets the cache mode for all subsequent reads made through this handle.
            #[must_use]
            pub fn cache_mode(mut self, mode: CacheMode) -> Self {
                self.scope.opts.cache_mode = mode;
                self
            }

            /// Overrides the client's retry policy for all calls made through this handle.
            #[must_use]
            pub fn retry_policy(mut self, cfg: Option<RetryConfig>) -> Self {
                self.scope.opts.retry = cfg;
                self
            }
        }
    };
}

scoped_options!(Spaces);
scoped_options!(Campaigns);
scoped_options!(Bookings);
scoped_options!(Messages);

impl AdClient {
    /// Liveness probe. Cached like any other GET.
    ///
    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn health(&self) -> Result<Value, AdError> {
        self.get("/health").await
    }

    pub fn spaces(&self) -> Spaces {
        Spaces::new(self)
    }

    pub fn campaigns(&self) -> Campaigns {
        Campaigns::new(self)
    }

    pub fn bookings(&self) -> Bookings {
        Bookings::new(self)
    }

    pub fn messages(&self) -> Messages {
        Messages::new(self)
    }
}
