//! HTTP request handlers

use super::error::ApiError;
use super::state::AppState;
use crate::providers::{ProviderAbout, ProviderKind};
use crate::results::{ProviderSection, ProviderWarning, ResultKey, SearchResult, Timing};
use crate::search::{DateRange, NeuralSearchType, NewsOptions, NewsSortBy, SearchQuery};
use crate::session::Session;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Login form
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session_id: Uuid,
}

/// Search form; everything but the term is optional
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub term: String,
    pub result_count: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub exa_search_type: Option<NeuralSearchType>,
    pub exa_category: Option<String>,
    /// Comma-separated NewsAPI source ids
    pub news_sources: Option<String>,
    pub news_language: Option<String>,
    pub news_sort_by: Option<NewsSortBy>,
}

impl SearchRequest {
    /// Fill unset fields with the query defaults
    pub fn into_query(self) -> SearchQuery {
        let mut query = SearchQuery::new(self.term);

        if let Some(count) = self.result_count {
            query = query.with_result_count(count);
        }
        if self.start_date.is_some() || self.end_date.is_some() {
            let default = DateRange::default();
            query = query.with_date_range(
                self.start_date.unwrap_or(default.start),
                self.end_date.unwrap_or(default.end),
            );
        }
        if let Some(search_type) = self.exa_search_type {
            query = query.with_search_type(search_type);
        }
        if let Some(category) = self.exa_category {
            query = query.with_category(category);
        }
        if let Some(sources) = self.news_sources {
            query = query.with_sources(NewsOptions::parse_sources(&sources));
        }
        if let Some(language) = self.news_language {
            query = query.with_language(language);
        }
        if let Some(sort_by) = self.news_sort_by {
            query = query.with_sort_by(sort_by);
        }

        query
    }
}

/// Search results response
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: SearchQuery,
    pub number_of_results: usize,
    pub web: SectionResponse,
    pub neural: SectionResponse,
    pub news: SectionResponse,
    pub warnings: Vec<ProviderWarning>,
    pub timings: Vec<Timing>,
}

#[derive(Debug, Serialize)]
pub struct SectionResponse {
    pub total_results: Option<u64>,
    pub results: Vec<ResultResponse>,
}

impl SectionResponse {
    fn new(section: ProviderSection, session: &Session) -> Self {
        Self {
            total_results: section.total_results,
            results: section
                .results
                .into_iter()
                .map(|result| ResultResponse {
                    key: result.key(),
                    selected: session.is_selected(&result.key()),
                    result,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub key: ResultKey,
    pub selected: bool,
    #[serde(flatten)]
    pub result: SearchResult,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub key: ResultKey,
    pub selected: bool,
    pub selection: Vec<ResultKey>,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub selection: Vec<ResultKey>,
}

#[derive(Debug, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub kind: ProviderKind,
    #[serde(flatten)]
    pub about: ProviderAbout,
}

fn require_session(state: &AppState, headers: &HeaderMap) -> Result<Arc<Session>, ApiError> {
    state.session(headers).ok_or(ApiError::Unauthorized)
}

fn require_login(state: &AppState, headers: &HeaderMap) -> Result<Arc<Session>, ApiError> {
    let session = require_session(state, headers)?;
    if !session.is_authenticated() {
        return Err(ApiError::Unauthorized);
    }
    Ok(session)
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Login handler
///
/// Reuses the caller's session when the header names one, otherwise opens a
/// new session. A rejected attempt does not leave a fresh session behind.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let form = json_body(body)?;

    let (session, fresh) = match state.session(&headers) {
        Some(session) => (session, false),
        None => (state.sessions.create(), true),
    };

    if let Err(e) = state.gate.authenticate(&session, &form.username, &form.password) {
        if fresh {
            state.sessions.remove(&session.id());
        }
        return Err(e.into());
    }

    Ok(Json(LoginResponse {
        session_id: session.id(),
    }))
}

/// Logout handler; drops the session with its cache and selection
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let session = require_session(&state, &headers)?;
    session.cache().clear();
    state.sessions.remove(&session.id());
    tracing::info!(session = %session.id(), "logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// Search handler
pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let session = require_login(&state, &headers)?;
    let query = json_body(body)?.into_query();

    let results = state.search.run_search(&session, &query).await?;

    Ok(Json(SearchResponse {
        number_of_results: results.result_count(),
        query,
        web: SectionResponse::new(results.web, &session),
        neural: SectionResponse::new(results.neural, &session),
        news: SectionResponse::new(results.news, &session),
        warnings: results.warnings,
        timings: results.timings,
    }))
}

/// Selection toggle handler
pub async fn toggle_selection(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ToggleRequest>, JsonRejection>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let session = require_login(&state, &headers)?;
    let key: ResultKey = json_body(body)?
        .key
        .parse()
        .map_err(|e: crate::results::ParseKeyError| ApiError::BadRequest(e.to_string()))?;

    let selected = session.toggle_selection(key.clone());

    Ok(Json(ToggleResponse {
        key,
        selected,
        selection: session.list_selected(),
    }))
}

/// Selection listing handler
pub async fn selection(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SelectionResponse>, ApiError> {
    let session = require_login(&state, &headers)?;
    Ok(Json(SelectionResponse {
        selection: session.list_selected(),
    }))
}

/// Stats handler; logged-in sessions only
pub async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_login(&state, &headers)?;

    let providers: Vec<ProviderInfo> = state
        .search
        .providers()
        .iter()
        .map(|p| ProviderInfo {
            name: p.name().to_string(),
            kind: p.kind(),
            about: p.about(),
        })
        .collect();

    Ok(Json(serde_json::json!({
        "providers": providers,
        "sessions": state.sessions.len(),
        "metrics": state.search.metrics().snapshot(),
    })))
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}
