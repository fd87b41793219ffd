//! The HTTP seam. The orchestrator never talks to the network directly; it hands a
//! [`TransportRequest`] to whatever [`Transport`] the client was built with.

use crate::core::{AdError, Method};
use bytes::Bytes;
use futures::future::BoxFuture;
use std::collections::HashMap;
use url::Url;

/// One physical HTTP attempt.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl TransportRequest {
    /// Looks up a request header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The raw outcome of a physical HTTP attempt. Header names are stored lower-cased.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// A fetch-like primitive. Dropping the returned future cancels the attempt.
///
/// Implementations should report transport failures as [`AdError::Network`] or
/// [`AdError::Timeout`] and return every HTTP status, successful or not, as a response.
pub trait Transport: Send + Sync {
    fn send(&self, req: TransportRequest) -> BoxFuture<'_, Result<TransportResponse, AdError>>;
}

/// The default [`Transport`], backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub const fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub(crate) fn with_user_agent(ua: &str) -> Result<Self, AdError> {
        let http = reqwest::Client::builder().user_agent(ua).build()?;
        Ok(Self { http })
    }
}

const fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, req: TransportRequest) -> BoxFuture<'_, Result<TransportResponse, AdError>> {
        Box::pin(async move {
            let mut builder = self.http.request(to_reqwest(req.method), req.url);
            for (name, value) in &req.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = req.body {
                builder = builder.body(body);
            }

            let resp = builder.send().await?;
            let status = resp.status().as_u16();
            let headers = resp
                .headers()
                .iter()
                .filter_map(|(k, v)| {
                    v.to_str()
                        .ok()
                        .map(|v| (k.as_str().to_ascii_lowercase(), v.to_string()))
                })
                .collect();
            let body = resp.bytes().await?;

            Ok::<_, AdError>(TransportResponse {
                status,
                headers,
                body,
            })
        })
    }
}
