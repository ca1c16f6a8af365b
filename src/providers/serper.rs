//! Serper web search provider
//!
//! Google organic results through the Serper JSON API.

use super::traits::*;
use crate::config::ProviderSettings;
use crate::results::SearchResult;
use crate::search::SearchQuery;
use serde_json::{json, Value};
use std::time::Duration;

/// Public Serper endpoint
pub const SERPER_BASE_URL: &str = "https://google.serper.dev";

/// Serper web search provider
pub struct Serper {
    api_key: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl Serper {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: SERPER_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn from_settings(settings: &ProviderSettings) -> Self {
        let mut serper = Self::new(settings.api_key.clone());
        if let Some(ref base_url) = settings.base_url {
            serper.base_url = base_url.clone();
        }
        serper.timeout = settings
            .timeout
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
        serper
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Custom date range filter, e.g. `cdr:1,cd_min:2024-01-01,cd_max:2024-01-31`
    fn date_filter(query: &SearchQuery) -> String {
        format!(
            "cdr:1,cd_min:{},cd_max:{}",
            query.date_range.start.format("%Y-%m-%d"),
            query.date_range.end.format("%Y-%m-%d")
        )
    }
}

impl Provider for Serper {
    fn name(&self) -> &str {
        "serper"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Web
    }

    fn about(&self) -> ProviderAbout {
        ProviderAbout::new()
            .website("https://serper.dev")
            .api_key_required(true)
            .results_format("JSON")
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn request(&self, query: &SearchQuery) -> Result<ProviderRequest, ProviderError> {
        let url = endpoint(&self.base_url, "search")?;

        let body = json!({
            "q": query.term,
            "num": query.result_count,
            "tbs": Self::date_filter(query),
        });

        Ok(ProviderRequest::post(url)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body))
    }

    fn response(&self, _query: &SearchQuery, raw: &Value) -> Result<ProviderResults, ProviderError> {
        let items = match raw.get("organic").and_then(|o| o.as_array()) {
            Some(items) => items,
            None => return Ok(ProviderResults::new()),
        };

        let mut results = Vec::new();
        let mut position = 1u32;

        for item in items {
            let url = match str_field(item, "link") {
                Some(link) => link,
                None => continue,
            };
            let title = str_field(item, "title").unwrap_or(url);

            let mut result = SearchResult::new(self.kind(), url, title).with_position(position);
            if let Some(snippet) = str_field(item, "snippet") {
                result = result.with_snippet(snippet);
            }
            result = result.with_published_at(str_field(item, "date").and_then(parse_timestamp));

            results.push(result);
            position += 1;
        }

        Ok(ProviderResults::with_results(results))
    }
}
