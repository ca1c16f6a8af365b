//! NewsAPI news provider
//!
//! Uses the `/v2/everything` endpoint, which searches all indexed articles.

use super::traits::*;
use crate::config::ProviderSettings;
use crate::results::SearchResult;
use crate::search::SearchQuery;
use serde_json::Value;
use std::time::Duration;

/// Public NewsAPI endpoint
pub const NEWSAPI_BASE_URL: &str = "https://newsapi.org";

/// Largest page NewsAPI serves
const MAX_PAGE_SIZE: u32 = 100;

/// NewsAPI article search provider
pub struct NewsApi {
    api_key: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl NewsApi {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: NEWSAPI_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn from_settings(settings: &ProviderSettings) -> Self {
        let mut news = Self::new(settings.api_key.clone());
        if let Some(ref base_url) = settings.base_url {
            news.base_url = base_url.clone();
        }
        news.timeout = settings
            .timeout
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
        news
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `{"status": "error", "code": ..., "message": ...}` bodies
    fn api_error(raw: &Value) -> Option<ProviderError> {
        if raw.get("status").and_then(|s| s.as_str()) != Some("error") {
            return None;
        }
        Some(ProviderError::Api {
            code: str_field(raw, "code").unwrap_or("unknown").to_string(),
            message: str_field(raw, "message").unwrap_or("no message").to_string(),
        })
    }
}

impl Provider for NewsApi {
    fn name(&self) -> &str {
        "newsapi"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::News
    }

    fn about(&self) -> ProviderAbout {
        ProviderAbout::new()
            .website("https://newsapi.org")
            .api_key_required(true)
            .results_format("JSON")
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn request(&self, query: &SearchQuery) -> Result<ProviderRequest, ProviderError> {
        let url = endpoint(&self.base_url, "v2/everything")?;
        let options = &query.news;

        let mut request = ProviderRequest::get(url)
            .header("X-Api-Key", &self.api_key)
            .param("q", &query.term)
            .param("from", query.date_range.start.format("%Y-%m-%d").to_string())
            .param("to", query.date_range.end.format("%Y-%m-%d").to_string())
            .param("language", &options.language)
            .param("sortBy", options.sort_by.as_str())
            .param("pageSize", options.page_size.clamp(1, MAX_PAGE_SIZE).to_string())
            .param("page", options.page.max(1).to_string());

        if !options.sources.is_empty() {
            request = request.param("sources", options.sources.join(","));
        }

        Ok(request)
    }

    fn decode(&self, response: ProviderResponse) -> Result<Value, ProviderError> {
        // Error bodies carry a code and message worth surfacing.
        if let Ok(raw) = response.json::<Value>() {
            if let Some(error) = Self::api_error(&raw) {
                return Err(error);
            }
            if response.is_success() {
                return Ok(raw);
            }
        }

        if !response.is_success() {
            return Err(ProviderError::Http(response.status));
        }
        response.json()
    }

    fn response(&self, _query: &SearchQuery, raw: &Value) -> Result<ProviderResults, ProviderError> {
        if let Some(error) = Self::api_error(raw) {
            return Err(error);
        }

        let items = match raw.get("articles").and_then(|a| a.as_array()) {
            Some(items) => items,
            None => return Ok(ProviderResults::new()),
        };

        let mut results = Vec::new();
        let mut position = 1u32;

        for item in items {
            let url = match str_field(item, "url") {
                Some(url) => url,
                None => continue,
            };
            let title = str_field(item, "title").unwrap_or(url);

            let mut result = SearchResult::new(self.kind(), url, title).with_position(position);
            if let Some(description) = str_field(item, "description") {
                result = result.with_snippet(description);
            }
            result.source_name = item
                .get("source")
                .and_then(|s| str_field(s, "name"))
                .map(str::to_string);
            result = result.with_published_at(str_field(item, "publishedAt").and_then(parse_timestamp));

            results.push(result);
            position += 1;
        }

        let total_results = raw.get("totalResults").and_then(|t| t.as_u64());

        Ok(ProviderResults {
            results,
            total_results,
        })
    }
}
