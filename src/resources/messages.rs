use super::Scope;
use crate::core::{AdClient, AdError, Method};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;

/// Conversations between advertisers and space owners.
#[derive(Debug, Clone)]
pub struct Messages {
    pub(super) scope: Scope,
}

impl Messages {
    pub(super) fn new(client: &AdClient) -> Self {
        Self {
            scope: Scope::new(client),
        }
    }

    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn conversations(&self) -> Result<Value, AdError> {
        self.scope.read("/messages/conversations").await
    }

    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn thread(&self, conversation_id: impl Display) -> Result<Value, AdError> {
        self.scope
            .read(&format!("/messages/conversations/{conversation_id}"))
            .await
    }

    /// # Errors
    ///
    /// See [`AdClient::request`].
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        conversation_id: impl Display,
        body: &B,
    ) -> Result<Value, AdError> {
        self.scope
            .write(
                "/messages",
                &format!("/messages/conversations/{conversation_id}"),
                Method::Post,
                Some(body),
            )
            .await
    }
}
