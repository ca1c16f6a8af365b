//! Exa neural search provider

use super::traits::*;
use crate::config::ProviderSettings;
use crate::results::SearchResult;
use crate::search::SearchQuery;
use serde_json::{json, Value};
use std::time::Duration;

/// Public Exa endpoint
pub const EXA_BASE_URL: &str = "https://api.exa.ai";

/// Exa neural / keyword search provider
pub struct Exa {
    api_key: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl Exa {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: EXA_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn from_settings(settings: &ProviderSettings) -> Self {
        let mut exa = Self::new(settings.api_key.clone());
        if let Some(ref base_url) = settings.base_url {
            exa.base_url = base_url.clone();
        }
        exa.timeout = settings
            .timeout
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
        exa
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Snippet lines: highlights when present, otherwise the cut body text
    fn snippets(item: &Value, max_characters: usize) -> Vec<String> {
        let highlights: Vec<String> = item
            .get("highlights")
            .and_then(|h| h.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|h| h.as_str())
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if !highlights.is_empty() {
            return highlights;
        }

        str_field(item, "text")
            .map(|text| vec![truncate_chars(text, max_characters)])
            .unwrap_or_default()
    }
}

/// Cut `text` to at most `max` characters on a char boundary
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

impl Provider for Exa {
    fn name(&self) -> &str {
        "exa"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Neural
    }

    fn about(&self) -> ProviderAbout {
        ProviderAbout::new()
            .website("https://exa.ai")
            .api_key_required(true)
            .results_format("JSON")
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn request(&self, query: &SearchQuery) -> Result<ProviderRequest, ProviderError> {
        let url = endpoint(&self.base_url, "search")?;
        let options = &query.neural;

        let mut body = json!({
            "query": query.term,
            "type": options.search_type.as_str(),
            "numResults": query.result_count,
            "startPublishedDate": format!("{}T00:00:00.000Z", query.date_range.start.format("%Y-%m-%d")),
            "endPublishedDate": format!("{}T23:59:59.999Z", query.date_range.end.format("%Y-%m-%d")),
            "useAutoprompt": options.use_autoprompt,
            "contents": {
                "text": {
                    "maxCharacters": options.max_characters,
                    "includeHtmlTags": options.include_html_tags,
                },
                "highlights": options.highlights,
            },
        });

        if let Some(ref category) = options.category {
            body["category"] = json!(category);
        }

        Ok(ProviderRequest::post(url)
            .header("x-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body))
    }

    fn response(&self, query: &SearchQuery, raw: &Value) -> Result<ProviderResults, ProviderError> {
        let items = match raw.get("results").and_then(|r| r.as_array()) {
            Some(items) => items,
            None => return Ok(ProviderResults::new()),
        };

        // Body text falls back to the same limit the request asked for.
        let max_characters = query.neural.max_characters as usize;
        let mut results = Vec::new();
        let mut position = 1u32;

        for item in items {
            let url = match str_field(item, "url") {
                Some(url) => url,
                None => continue,
            };
            let title = str_field(item, "title").unwrap_or("No title");

            let mut result = SearchResult::new(self.kind(), url, title).with_position(position);
            result.snippets = Self::snippets(item, max_characters);
            result = result.with_published_at(str_field(item, "publishedDate").and_then(parse_timestamp));

            results.push(result);
            position += 1;
        }

        Ok(ProviderResults::with_results(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::NeuralSearchType;
    use chrono::NaiveDate;

    fn query() -> SearchQuery {
        SearchQuery::new("apple.com")
            .with_result_count(10)
            .with_date_range(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            )
            .with_search_type(NeuralSearchType::Keyword)
    }

    #[test]
    fn test_exa_request() {
        let request = Exa::new("secret").request(&query()).unwrap();

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://api.exa.ai/search");
        assert_eq!(request.headers.get("x-api-key").map(String::as_str), Some("secret"));

        let body = request.body.unwrap();
        assert_eq!(body["query"], "apple.com");
        assert_eq!(body["type"], "keyword");
        assert_eq!(body["numResults"], 10);
        assert_eq!(body["startPublishedDate"], "2024-01-01T00:00:00.000Z");
        assert_eq!(body["endPublishedDate"], "2024-01-31T23:59:59.999Z");
        assert_eq!(body["useAutoprompt"], true);
        assert_eq!(body["contents"]["highlights"], true);
        assert_eq!(body["contents"]["text"]["maxCharacters"], 300);
        assert!(body.get("category").is_none());
    }

    #[test]
    fn test_category_included_when_set() {
        let request = Exa::new("k").request(&query().with_category("company")).unwrap();
        assert_eq!(request.body.unwrap()["category"], "company");
    }

    #[test]
    fn test_exa_response_prefers_highlights() {
        let raw = json!({
            "autopromptString": "apple.com",
            "results": [
                {
                    "title": "Apple unveils new chips",
                    "url": "https://news.example.com/apple-chips",
                    "publishedDate": "2024-01-15T08:00:00.000Z",
                    "text": "Long body text",
                    "highlights": ["Apple <b>unveiled</b> chips", "  "]
                },
                {
                    "url": "https://blog.example.com/apple",
                    "text": "Body used as a fallback"
                },
                {"title": "missing url"}
            ]
        });

        let parsed = Exa::new("k").response(&query(), &raw).unwrap();
        assert_eq!(parsed.results.len(), 2);

        let first = &parsed.results[0];
        assert_eq!(first.provider, ProviderKind::Neural);
        assert_eq!(first.snippets, vec!["Apple <b>unveiled</b> chips".to_string()]);
        assert!(first.published_at.is_some());

        let second = &parsed.results[1];
        assert_eq!(second.title, "No title");
        assert_eq!(second.snippets, vec!["Body used as a fallback".to_string()]);
        assert_eq!(second.position, 2);
    }

    #[test]
    fn test_fallback_text_follows_max_characters() {
        let raw = json!({
            "results": [{"url": "https://example.com/apple", "text": "x".repeat(1000)}]
        });
        let mut query = query();

        let parsed = Exa::new("k").response(&query, &raw).unwrap();
        assert_eq!(parsed.results[0].snippets[0].chars().count(), 300);

        query.neural.max_characters = 120;
        let parsed = Exa::new("k").response(&query, &raw).unwrap();
        assert_eq!(parsed.results[0].snippets[0].chars().count(), 120);
    }

    #[test]
    fn test_missing_results_is_empty() {
        let parsed = Exa::new("k").response(&query(), &json!({"requestId": "abc"})).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 300), "short");
    }
}
