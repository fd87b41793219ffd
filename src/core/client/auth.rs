//! Bearer token acquisition. Tokens come from an injected provider; a failing provider
//! never fails the request, it just leaves it unauthenticated.

use crate::core::AdError;
use futures::future::{self, BoxFuture};

/// Supplies the bearer token attached to each attempt.
pub trait TokenProvider: Send + Sync {
    /// Returns the current token, `Ok(None)` when signed out.
    fn token(&self) -> BoxFuture<'_, Result<Option<String>, AdError>>;
}

/// A provider that always returns the same token.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenProvider for StaticToken {
    fn token(&self) -> BoxFuture<'_, Result<Option<String>, AdError>> {
        Box::pin(future::ready(Ok::<_, AdError>(Some(self.0.clone()))))
    }
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> BoxFuture<'_, Result<Option<String>, AdError>> {
        Box::pin(future::ready(Ok::<_, AdError>(self())))
    }
}

/// Resolves the provider once for an attempt, swallowing failures.
pub(crate) async fn bearer(provider: Option<&dyn TokenProvider>) -> Option<String> {
    let provider = provider?;
    match provider.token().await {
        Ok(Some(token)) if !token.is_empty() => Some(token),
        Ok(_) => None,
        Err(_err) => {
            log_warn!(error = %_err, "token provider failed; sending unauthenticated");
            None
        }
    }
}
