//! Provider traits and types

use crate::results::SearchResult;
use crate::search::SearchQuery;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// The three kinds of provider a search fans out to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// General web search
    Web,
    /// Neural / semantic search
    Neural,
    /// News articles
    News,
}

impl ProviderKind {
    /// All provider kinds, in display order
    pub const ALL: [ProviderKind; 3] = [ProviderKind::Web, ProviderKind::Neural, ProviderKind::News];

    /// Tag used in result keys and cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Neural => "neural",
            Self::News => "news",
        }
    }

    /// Parse a tag produced by [`ProviderKind::as_str`]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "web" => Some(Self::Web),
            "neural" => Some(Self::Neural),
            "news" => Some(Self::News),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised while talking to a provider
///
/// Every variant is recoverable: the aggregator turns it into an empty
/// section plus a warning for that provider only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP error: {0}")]
    Http(u16),

    #[error("provider error {code}: {message}")]
    Api { code: String, message: String },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Short machine-readable category
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Network(_) => "network_error",
            Self::Http(_) => "http_error",
            Self::Api { .. } => "api_error",
            Self::Parse(_) => "parse_error",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

/// Parsed results of one provider call
#[derive(Debug, Clone, Default)]
pub struct ProviderResults {
    /// Search results in provider order
    pub results: Vec<SearchResult>,
    /// Number of total results (if the provider reports it)
    pub total_results: Option<u64>,
}

impl ProviderResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// HTTP request to be made for a provider
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// URL to request
    pub url: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Query parameters, kept sorted so cache keys are canonical
    pub params: BTreeMap<String, String>,
    /// JSON body for POST requests
    pub body: Option<Value>,
}

impl ProviderRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            params: BTreeMap::new(),
            body: None,
        }
    }

    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            headers: HashMap::new(),
            params: BTreeMap::new(),
            body: None,
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add JSON body
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// HTTP response from a provider request
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
}

impl ProviderResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ProviderError> {
        serde_json::from_str(&self.text).map_err(|e| ProviderError::Parse(e.to_string()))
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Provider metadata
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProviderAbout {
    /// Website URL
    pub website: Option<String>,
    /// Whether an API key is required
    pub require_api_key: bool,
    /// Result format (JSON)
    pub results: String,
}

impl ProviderAbout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn website(mut self, url: impl Into<String>) -> Self {
        self.website = Some(url.into());
        self
    }

    pub fn api_key_required(mut self, required: bool) -> Self {
        self.require_api_key = required;
        self
    }

    pub fn results_format(mut self, format: impl Into<String>) -> Self {
        self.results = format.into();
        self
    }
}

/// Adapter between the common [`SearchQuery`] and one external API
///
/// Building the request and mapping the response are pure; the HTTP
/// round trip happens in the transport, so adapters can be tested without
/// a network.
pub trait Provider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Which result list this provider feeds
    fn kind(&self) -> ProviderKind;

    /// Short description of the provider
    fn about(&self) -> ProviderAbout {
        ProviderAbout::default()
    }

    /// Configured timeout, if it overrides the default
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Build the HTTP request for a search
    fn request(&self, query: &SearchQuery) -> Result<ProviderRequest, ProviderError>;

    /// Turn a raw HTTP response into the provider's JSON document.
    ///
    /// Non-2xx responses are failures and are never cached.
    fn decode(&self, response: ProviderResponse) -> Result<Value, ProviderError> {
        if !response.is_success() {
            return Err(ProviderError::Http(response.status));
        }
        response.json()
    }

    /// Map the provider's JSON document into results for `query`
    fn response(&self, query: &SearchQuery, raw: &Value) -> Result<ProviderResults, ProviderError>;
}

/// Join a provider base URL and an endpoint path
pub(crate) fn endpoint(base: &str, path: &str) -> Result<String, ProviderError> {
    let mut url = Url::parse(base)
        .map_err(|e| ProviderError::InvalidRequest(format!("bad base url {}: {}", base, e)))?;

    if !url.path().ends_with('/') {
        let with_slash = format!("{}/", url.path());
        url.set_path(&with_slash);
    }

    url.join(path)
        .map(|u| u.to_string())
        .map_err(|e| ProviderError::InvalidRequest(format!("bad endpoint {}: {}", path, e)))
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)))
}

/// Read a string field, ignoring blanks
pub(crate) fn str_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        assert_eq!(
            endpoint("https://google.serper.dev", "search").unwrap(),
            "https://google.serper.dev/search"
        );
        assert_eq!(
            endpoint("http://127.0.0.1:8080/mock/", "v2/everything").unwrap(),
            "http://127.0.0.1:8080/mock/v2/everything"
        );
        assert!(endpoint("not a url", "search").is_err());
    }

    #[test]
    fn test_parse_timestamp() {
        let full = parse_timestamp("2024-03-01T12:30:00Z").unwrap();
        assert_eq!(full.to_rfc3339(), "2024-03-01T12:30:00+00:00");

        let date_only = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(date_only.to_rfc3339(), "2024-03-01T00:00:00+00:00");

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_provider_kind_tags() {
        for kind in ProviderKind::ALL {
            assert_eq!(ProviderKind::from_tag(kind.as_str()), Some(kind));
        }
        assert_eq!(ProviderKind::from_tag("images"), None);
    }

    #[test]
    fn test_default_decode_rejects_non_success() {
        struct Dummy;
        impl Provider for Dummy {
            fn name(&self) -> &str {
                "dummy"
            }
            fn kind(&self) -> ProviderKind {
                ProviderKind::Web
            }
            fn request(&self, _query: &SearchQuery) -> Result<ProviderRequest, ProviderError> {
                Ok(ProviderRequest::get("http://localhost"))
            }
            fn response(
                &self,
                _query: &SearchQuery,
                _raw: &Value,
            ) -> Result<ProviderResults, ProviderError> {
                Ok(ProviderResults::new())
            }
        }

        let response = ProviderResponse {
            status: 503,
            text: "unavailable".to_string(),
        };
        assert_eq!(Dummy.decode(response), Err(ProviderError::Http(503)));

        let response = ProviderResponse {
            status: 200,
            text: "{not json".to_string(),
        };
        assert!(matches!(Dummy.decode(response), Err(ProviderError::Parse(_))));
    }
}
