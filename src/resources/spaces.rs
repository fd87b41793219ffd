use super::Scope;
use crate::core::{AdClient, AdError, Method};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;

/// Advertising spaces: the inventory owners list on the marketplace.
#[derive(Debug, Clone)]
pub struct Spaces {
    pub(super) scope: Scope,
}

impl Spaces {
    pub(super) fn new(client: &AdClient) -> Self {
        Self {
            scope: Scope::new(client),
        }
    }

    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn list(&self) -> Result<Value, AdError> {
        self.scope.read("/spaces").await
    }

    /// Lists spaces matching a raw query string, e.g. `city=Lyon&type=billboard`.
    ///
    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn search(&self, query: &str) -> Result<Value, AdError> {
        self.scope.read(&format!("/spaces?{query}")).await
    }

    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn get(&self, id: impl Display) -> Result<Value, AdError> {
        self.scope.read(&format!("/spaces/{id}")).await
    }

    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<Value, AdError> {
        self.scope
            .write("/spaces", "/spaces", Method::Post, Some(body))
            .await
    }

    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        id: impl Display,
        body: &B,
    ) -> Result<Value, AdError> {
        self.scope
            .write("/spaces", &format!("/spaces/{id}"), Method::Put, Some(body))
            .await
    }
}
