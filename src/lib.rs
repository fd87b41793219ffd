//! adspace-rs: resilient request orchestration for the ad-space marketplace API.
//!
//! Every call goes through [`AdClient::request`], which layers four behaviors over an
//! injected [`Transport`]:
//! - identical concurrent calls share one network attempt;
//! - successful GETs are cached for a TTL (60 s by default);
//! - a `429` puts its endpoint in a local backoff window, so later calls fail fast;
//! - timeouts, transport errors and 5xx responses are retried with exponential backoff.
//!
//! A background janitor evicts expired cache entries and ended backoff windows.
//! [`AdClient::destroy`] stops it and clears all state.

#[macro_use]
mod macros;

pub mod core;
pub mod resources;

pub use crate::core::{
    AdClient, AdClientBuilder, AdError, Backoff, CacheMode, CacheStats, Method, RequestKey,
    RequestOptions, RetryConfig, ReqwestTransport, StaticToken, TokenProvider, Transport,
    TransportRequest, TransportResponse,
};
pub use crate::resources::{Bookings, Campaigns, Messages, Spaces};
