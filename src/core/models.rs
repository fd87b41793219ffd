use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// HTTP methods understood by the request orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a logical request, shared by the response cache and the in-flight registry.
///
/// The key is `METHOD:endpoint:payload`, where the payload is serialized as-is. Object
/// fields keep their insertion order, so two payloads that differ only in field order
/// produce different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn new(method: Method, endpoint: &str, payload: Option<&Value>) -> Self {
        let body = payload.map_or_else(String::new, Value::to_string);
        Self(format!("{method}:{endpoint}:{body}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point-in-time snapshot of the client's internal stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// All cached entries, fresh or not.
    pub total: usize,
    /// Entries that would still be served.
    pub valid: usize,
    /// Entries past their TTL that the janitor has not swept yet.
    pub expired: usize,
    /// Requests currently in flight.
    pub pending: usize,
    /// Endpoints with a rate-limit window still in force.
    pub backoffs: usize,
}
