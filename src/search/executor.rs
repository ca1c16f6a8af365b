//! Search execution and orchestration

use super::models::{QueryError, SearchQuery};
use crate::cache::{request_cache_key, CacheStatus, ResultCache};
use crate::config::Settings;
use crate::metrics::Metrics;
use crate::network::{HttpClient, Transport};
use crate::providers::{Provider, ProviderError, ProviderKind, ProviderResults, ProviderSet};
use crate::results::{ProviderSection, ProviderWarning, SearchResults, Timing};
use crate::session::Session;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Search refused before any provider was contacted
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("session is not authenticated")]
    NotAuthenticated,

    #[error(transparent)]
    InvalidQuery(#[from] QueryError),
}

/// Outcome of one provider within a search
struct ProviderOutcome {
    provider: ProviderKind,
    elapsed: Duration,
    result: Result<(ProviderResults, CacheStatus), ProviderError>,
}

/// Search executor that fans a query out to the web, neural and news providers
pub struct Search {
    /// Executes provider requests
    transport: Arc<dyn Transport>,
    providers: ProviderSet,
    metrics: Arc<Metrics>,
    /// Default timeout
    default_timeout: Duration,
    /// Maximum timeout
    max_timeout: Duration,
}

impl Search {
    /// Create a new search executor
    pub fn new(transport: Arc<dyn Transport>, providers: ProviderSet) -> Self {
        Self {
            transport,
            providers,
            metrics: Arc::new(Metrics::new()),
            default_timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT),
            max_timeout: Duration::from_secs(crate::MAX_TIMEOUT),
        }
    }

    /// Build the HTTP client and the three adapters from settings
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let client = HttpClient::with_settings(&settings.outgoing)?;
        let mut search = Self::new(Arc::new(client), ProviderSet::from_settings(settings))
            .with_timeout(Duration::try_from_secs_f64(settings.outgoing.request_timeout)?);
        if let Some(max) = settings.outgoing.max_request_timeout {
            search = search.with_max_timeout(Duration::try_from_secs_f64(max)?);
        }
        Ok(search)
    }

    /// Set default timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Set maximum timeout
    pub fn with_max_timeout(mut self, timeout: Duration) -> Self {
        self.max_timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    /// Run `query` against all three providers for `session`
    ///
    /// A provider failure never fails the search: its section stays empty
    /// and a warning is added instead.
    pub async fn run_search(
        &self,
        session: &Session,
        query: &SearchQuery,
    ) -> Result<SearchResults, SearchError> {
        if !session.is_authenticated() {
            return Err(SearchError::NotAuthenticated);
        }
        query.validate()?;

        self.metrics.inc_search();
        info!(session = %session.id(), "searching {}", query);

        let cache = session.cache();
        let (web, neural, news) = futures::join!(
            self.search_provider(self.providers.web.as_ref(), query, cache),
            self.search_provider(self.providers.neural.as_ref(), query, cache),
            self.search_provider(self.providers.news.as_ref(), query, cache),
        );

        let mut results = SearchResults::new();
        for outcome in [web, neural, news] {
            self.merge(&mut results, outcome);
        }

        debug!(
            "search {} returned {} results, {} warnings",
            query,
            results.result_count(),
            results.warnings.len()
        );

        Ok(results)
    }

    /// Search a single provider
    async fn search_provider(
        &self,
        provider: &dyn Provider,
        query: &SearchQuery,
        cache: &ResultCache,
    ) -> ProviderOutcome {
        let start = Instant::now();
        let result = self.fetch(provider, query, cache).await;

        ProviderOutcome {
            provider: provider.kind(),
            elapsed: start.elapsed(),
            result,
        }
    }

    async fn fetch(
        &self,
        provider: &dyn Provider,
        query: &SearchQuery,
        cache: &ResultCache,
    ) -> Result<(ProviderResults, CacheStatus), ProviderError> {
        let kind = provider.kind();
        let provider_timeout = self.provider_timeout(provider);

        let request = provider.request(query)?;
        let key = request_cache_key(kind, &request);

        debug!(
            "searching {} with timeout {:?}",
            provider.name(),
            provider_timeout
        );

        let transport = self.transport.clone();
        let metrics = self.metrics.clone();
        let fetch = async move {
            let started = Instant::now();
            let response = match timeout(provider_timeout, transport.execute(request, provider_timeout)).await {
                Ok(response) => response,
                Err(_) => Err(ProviderError::Timeout),
            };
            metrics.record_fetch(kind, started.elapsed().as_millis() as u64);
            response.and_then(|response| provider.decode(response))
        };

        let (raw, status) = cache.get_or_fetch(key, fetch).await?;
        if status == CacheStatus::Hit {
            self.metrics.record_cache_hit(kind);
        }

        let results = provider.response(query, &raw)?;
        Ok((results, status))
    }

    fn provider_timeout(&self, provider: &dyn Provider) -> Duration {
        provider
            .timeout()
            .unwrap_or(self.default_timeout)
            .min(self.max_timeout)
    }

    fn merge(&self, results: &mut SearchResults, outcome: ProviderOutcome) {
        let provider = outcome.provider;
        let time_ms = outcome.elapsed.as_millis() as u64;

        match outcome.result {
            Ok((provider_results, status)) => {
                self.metrics.record_success(provider);
                let result_count = provider_results.results.len();

                let section = results.section_mut(provider);
                section.results = provider_results.results;
                section.total_results = provider_results.total_results;

                results.add_timing(Timing {
                    provider,
                    time_ms,
                    result_count,
                    cached: status == CacheStatus::Hit,
                });

                debug!(
                    "{} returned {} results in {}ms ({:?})",
                    provider, result_count, time_ms, status
                );
            }
            Err(e) => {
                self.metrics.record_error(provider);
                warn!("{} search failed: {}", provider, e);

                *results.section_mut(provider) = ProviderSection::empty(provider);
                results.add_warning(ProviderWarning::new(provider, &e));
            }
        }
    }
}
