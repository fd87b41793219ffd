use super::Scope;
use crate::core::{AdClient, AdError, Method};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;

/// Bookings of a space for a date range.
#[derive(Debug, Clone)]
pub struct Bookings {
    pub(super) scope: Scope,
}

impl Bookings {
    pub(super) fn new(client: &AdClient) -> Self {
        Self {
            scope: Scope::new(client),
        }
    }

    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn list(&self) -> Result<Value, AdError> {
        self.scope.read("/bookings").await
    }

    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn get(&self, id: impl Display) -> Result<Value, AdError> {
        self.scope.read(&format!("/bookings/{id}")).await
    }

    /// # Errors
    ///
    /// See [`AdClient::request`]. A `429` here backs off every call to `/bookings`.
    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<Value, AdError> {
        self.scope
            .write("/bookings", "/bookings", Method::Post, Some(body))
            .await
    }

    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn cancel(&self, id: impl Display) -> Result<Value, AdError> {
        self.scope
            .write::<Value>("/bookings", &format!("/bookings/{id}"), Method::Delete, None)
            .await
    }
}
