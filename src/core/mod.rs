//! Core components of the `adspace-rs` client.
//!
//! This module contains the request-orchestration layer:
//! - The main [`AdClient`] and its builder.
//! - The primary [`AdError`] type.
//! - Shared models like [`Method`], [`RequestKey`] and [`CacheStats`].
//! - The [`Transport`] seam the client sends every attempt through.

/// The main client (`AdClient`), builder, and resilience policy.
pub mod client;
/// The primary error type (`AdError`) for the crate.
pub mod error;
/// Shared data models used across the crate.
pub mod models;
/// The HTTP seam and its `reqwest` implementation.
pub mod transport;

// convenient re-exports so most code can just `use crate::core::AdClient`
pub use client::{
    AdClient, AdClientBuilder, Backoff, CacheMode, RequestOptions, RetryConfig, StaticToken,
    TokenProvider,
};
pub use error::AdError;
pub use models::{CacheStats, Method, RequestKey};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
