use super::Scope;
use crate::core::{AdClient, AdError, Method};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct Campaigns {
    pub(super) scope: Scope,
}

impl Campaigns {
    pub(super) fn new(client: &AdClient) -> Self {
        Self {
            scope: Scope::new(client),
        }
    }

    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn list(&self) -> Result<Value, AdError> {
        self.scope.read("/campaigns").await
    }

    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn get(&self, id: impl Display) -> Result<Value, AdError> {
        self.scope.read(&format!("/campaigns/{id}")).await
    }

    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<Value, AdError> {
        self.scope
            .write("/campaigns", "/campaigns", Method::Post, Some(body))
            .await
    }

    /// Partially updates a campaign (status, budget, dates, ...).
    ///
    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        id: impl Display,
        body: &B,
    ) -> Result<Value, AdError> {
        self.scope
            .write("/campaigns", &format!("/campaigns/{id}"), Method::Patch, Some(body))
            .await
    }
}
