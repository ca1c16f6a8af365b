//! Provider contract tests
//!
//! Each adapter is driven through the real HTTP client against a mock
//! server: the request must carry the provider's auth header and body or
//! query shape, and the provider's response must map onto results.

use chrono::NaiveDate;
use company_search::network::{HttpClient, Transport};
use company_search::providers::exa::Exa;
use company_search::providers::newsapi::NewsApi;
use company_search::providers::serper::Serper;
use company_search::providers::{Provider, ProviderError, ProviderResults};
use company_search::search::{NeuralSearchType, NewsSortBy, SearchQuery};
use company_search::ProviderKind;
use serde_json::json;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn query() -> SearchQuery {
    SearchQuery::new("apple.com")
        .with_result_count(15)
        .with_date_range(
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
        )
}

/// Request, round trip, decode and map, as the search executor does
async fn run(provider: &dyn Provider, query: &SearchQuery) -> Result<ProviderResults, ProviderError> {
    let client = HttpClient::new().unwrap();
    let request = provider.request(query)?;
    let response = client.execute(request, Duration::from_secs(5)).await?;
    let raw = provider.decode(response)?;
    provider.response(query, &raw)
}

// ────────────────────────────────────────────────────────────────────────────
// Serper
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_serper_request_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("X-API-KEY", "serper-key"))
        .and(body_partial_json(json!({
            "q": "apple.com",
            "num": 15,
            "tbs": "cdr:1,cd_min:2024-04-01,cd_max:2024-04-30"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"organic": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let serper = Serper::new("serper-key").with_base_url(mock_server.uri());
    let results = assert_ok!(run(&serper, &query()).await);
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_serper_response_mapping() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "searchParameters": {"q": "apple.com"},
            "organic": [
                {"title": "Apple", "link": "https://www.apple.com/", "snippet": "Discover the innovative world of Apple.", "position": 1},
                {"title": "No link here", "snippet": "skipped"},
                {"title": "Apple Support", "link": "https://support.apple.com/", "position": 2}
            ]
        })))
        .mount(&mock_server)
        .await;

    let serper = Serper::new("k").with_base_url(mock_server.uri());
    let results = assert_ok!(run(&serper, &query()).await);

    assert_eq!(results.results.len(), 2);
    let first = &results.results[0];
    assert_eq!(first.provider, ProviderKind::Web);
    assert_eq!(first.url, "https://www.apple.com/");
    assert_eq!(first.title, "Apple");
    assert_eq!(first.snippets, vec!["Discover the innovative world of Apple."]);
    assert_eq!(first.position, 1);
    assert_eq!(results.results[1].url, "https://support.apple.com/");
    assert!(results.results[1].snippets.is_empty());
}

#[tokio::test]
async fn test_serper_rejected_key_is_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "Unauthorized.", "statusCode": 403
        })))
        .mount(&mock_server)
        .await;

    let serper = Serper::new("bad").with_base_url(mock_server.uri());
    let error = assert_err!(run(&serper, &query()).await);
    assert_eq!(error, ProviderError::Http(403));
}

// ────────────────────────────────────────────────────────────────────────────
// Exa
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_exa_request_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("x-api-key", "exa-key"))
        .and(body_partial_json(json!({
            "query": "apple.com",
            "type": "keyword",
            "category": "company",
            "numResults": 15,
            "startPublishedDate": "2024-04-01T00:00:00.000Z",
            "endPublishedDate": "2024-04-30T23:59:59.999Z",
            "useAutoprompt": true,
            "contents": {
                "text": {"maxCharacters": 300, "includeHtmlTags": true},
                "highlights": true
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let exa = Exa::new("exa-key").with_base_url(mock_server.uri());
    let query = query()
        .with_search_type(NeuralSearchType::Keyword)
        .with_category("company");
    assert_ok!(run(&exa, &query).await);
}

#[tokio::test]
async fn test_exa_response_mapping() {
    let mock_server = MockServer::start().await;
    let long_text = "x".repeat(1000);

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "requestId": "abc",
            "results": [
                {
                    "title": "Apple Inc. company profile",
                    "url": "https://www.apple.com/about/",
                    "publishedDate": "2024-04-12T00:00:00.000Z",
                    "highlights": ["Apple designs consumer electronics.", "  "]
                },
                {
                    "url": "https://example.com/apple",
                    "text": long_text
                }
            ]
        })))
        .mount(&mock_server)
        .await;

    let exa = Exa::new("k").with_base_url(mock_server.uri());
    let results = assert_ok!(run(&exa, &query()).await);

    assert_eq!(results.results.len(), 2);
    let first = &results.results[0];
    assert_eq!(first.provider, ProviderKind::Neural);
    assert_eq!(first.snippets, vec!["Apple designs consumer electronics."]);
    assert!(first.published_at.is_some());

    let second = &results.results[1];
    assert_eq!(second.title, "No title");
    assert_eq!(second.snippets.len(), 1);
    assert_eq!(second.snippets[0].chars().count(), 300);
}

// ────────────────────────────────────────────────────────────────────────────
// NewsAPI
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_newsapi_request_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .and(header("X-Api-Key", "news-key"))
        .and(query_param("q", "apple.com"))
        .and(query_param("from", "2024-04-01"))
        .and(query_param("to", "2024-04-30"))
        .and(query_param("language", "de"))
        .and(query_param("sortBy", "popularity"))
        .and(query_param("pageSize", "100"))
        .and(query_param("sources", "bbc-news,cnn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok", "totalResults": 0, "articles": []
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let news = NewsApi::new("news-key").with_base_url(mock_server.uri());
    let query = query()
        .with_language("de")
        .with_sort_by(NewsSortBy::Popularity)
        .with_sources(vec!["bbc-news".to_string(), "cnn".to_string()]);
    let results = assert_ok!(run(&news, &query).await);
    assert_eq!(results.total_results, Some(0));
}

#[tokio::test]
async fn test_newsapi_response_mapping() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {
                    "source": {"id": "the-verge", "name": "The Verge"},
                    "title": "Apple announces new MacBook",
                    "description": "The laptop ships next week.",
                    "url": "https://www.theverge.com/apple-macbook",
                    "publishedAt": "2024-04-20T14:30:00Z"
                },
                {
                    "source": {"id": null, "name": "Removed"},
                    "title": "[Removed]",
                    "description": null,
                    "url": null
                }
            ]
        })))
        .mount(&mock_server)
        .await;

    let news = NewsApi::new("k").with_base_url(mock_server.uri());
    let results = assert_ok!(run(&news, &query()).await);

    assert_eq!(results.total_results, Some(2));
    assert_eq!(results.results.len(), 1);
    let article = &results.results[0];
    assert_eq!(article.provider, ProviderKind::News);
    assert_eq!(article.source_name.as_deref(), Some("The Verge"));
    assert_eq!(article.snippets, vec!["The laptop ships next week."]);
    assert_eq!(
        article.published_at.map(|t| t.to_rfc3339()),
        Some("2024-04-20T14:30:00+00:00".to_string())
    );
}

#[tokio::test]
async fn test_newsapi_error_body_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": "error",
            "code": "apiKeyInvalid",
            "message": "Your API key is invalid or incorrect."
        })))
        .mount(&mock_server)
        .await;

    let news = NewsApi::new("bad").with_base_url(mock_server.uri());
    let error = assert_err!(run(&news, &query()).await);
    assert_eq!(
        error,
        ProviderError::Api {
            code: "apiKeyInvalid".to_string(),
            message: "Your API key is invalid or incorrect.".to_string(),
        }
    );
}
