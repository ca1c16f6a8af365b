//! Result type definitions

use crate::providers::{ProviderError, ProviderKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A single search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Provider that returned this result
    pub provider: ProviderKind,
    /// The URL of the result
    pub url: String,
    /// The title of the result
    pub title: String,
    /// Snippet or highlight lines
    #[serde(default)]
    pub snippets: Vec<String>,
    /// Publication time, when the provider reports one
    pub published_at: Option<DateTime<Utc>>,
    /// Publisher name (news articles)
    pub source_name: Option<String>,
    /// 1-based position in the provider's list
    pub position: u32,
}

impl SearchResult {
    /// Create a new result
    pub fn new(provider: ProviderKind, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            provider,
            url: url.into(),
            title: title.into(),
            snippets: Vec::new(),
            published_at: None,
            source_name: None,
            position: 0,
        }
    }

    /// Add a snippet line
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippets.push(snippet.into());
        self
    }

    /// Set the publication time
    pub fn with_published_at(mut self, published_at: Option<DateTime<Utc>>) -> Self {
        self.published_at = published_at;
        self
    }

    /// Set the position
    pub fn with_position(mut self, position: u32) -> Self {
        self.position = position;
        self
    }

    /// Selection key: provider tag plus URL
    pub fn key(&self) -> ResultKey {
        ResultKey::new(self.provider, self.url.clone())
    }
}

/// Identity of a result across re-renders: `<provider>:<url>`
///
/// The same URL coming from two providers yields two different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultKey {
    pub provider: ProviderKind,
    pub url: String,
}

impl ResultKey {
    pub fn new(provider: ProviderKind, url: impl Into<String>) -> Self {
        Self {
            provider,
            url: url.into(),
        }
    }
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.url)
    }
}

/// Malformed result key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid result key: {0}")]
pub struct ParseKeyError(pub String);

impl FromStr for ResultKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, url) = s.split_once(':').ok_or_else(|| ParseKeyError(s.to_string()))?;
        let provider = ProviderKind::from_tag(tag).ok_or_else(|| ParseKeyError(s.to_string()))?;
        if url.is_empty() {
            return Err(ParseKeyError(s.to_string()));
        }
        Ok(Self::new(provider, url))
    }
}

impl Serialize for ResultKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResultKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Non-fatal failure of one provider during a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderWarning {
    pub provider: ProviderKind,
    /// Error category, e.g. `timeout`
    pub kind: String,
    pub message: String,
}

impl ProviderWarning {
    pub fn new(provider: ProviderKind, error: &ProviderError) -> Self {
        Self {
            provider,
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ProviderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} search failed: {}", self.provider, self.message)
    }
}

/// Provider response timing information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timing {
    pub provider: ProviderKind,
    /// Response time in milliseconds
    pub time_ms: u64,
    /// Number of results returned
    pub result_count: usize,
    /// Whether the response came from the cache
    pub cached: bool,
}
