//! Per-provider result sections of one search

use super::types::*;
use crate::providers::ProviderKind;
use serde::Serialize;

/// Results of a single provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSection {
    pub provider: ProviderKind,
    pub results: Vec<SearchResult>,
    /// Number of total results (if known)
    pub total_results: Option<u64>,
}

impl ProviderSection {
    /// Create an empty section
    pub fn empty(provider: ProviderKind) -> Self {
        Self {
            provider,
            results: Vec::new(),
            total_results: None,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Selection keys in display order
    pub fn keys(&self) -> Vec<ResultKey> {
        self.results.iter().map(SearchResult::key).collect()
    }
}

/// Combined output of the three providers
///
/// Sections are kept apart; no URL de-duplication happens across them.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub web: ProviderSection,
    pub neural: ProviderSection,
    pub news: ProviderSection,
    /// Providers that failed, one entry each
    pub warnings: Vec<ProviderWarning>,
    /// Provider timings
    pub timings: Vec<Timing>,
}

impl Default for SearchResults {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchResults {
    /// Create three empty sections
    pub fn new() -> Self {
        Self {
            web: ProviderSection::empty(ProviderKind::Web),
            neural: ProviderSection::empty(ProviderKind::Neural),
            news: ProviderSection::empty(ProviderKind::News),
            warnings: Vec::new(),
            timings: Vec::new(),
        }
    }

    /// Get the section of a provider
    pub fn section(&self, provider: ProviderKind) -> &ProviderSection {
        match provider {
            ProviderKind::Web => &self.web,
            ProviderKind::Neural => &self.neural,
            ProviderKind::News => &self.news,
        }
    }

    /// Get the section of a provider, mutably
    pub fn section_mut(&mut self, provider: ProviderKind) -> &mut ProviderSection {
        match provider {
            ProviderKind::Web => &mut self.web,
            ProviderKind::Neural => &mut self.neural,
            ProviderKind::News => &mut self.news,
        }
    }

    /// Record a provider failure
    pub fn add_warning(&mut self, warning: ProviderWarning) {
        self.warnings.push(warning);
    }

    /// Record provider timing
    pub fn add_timing(&mut self, timing: Timing) {
        self.timings.push(timing);
    }

    /// Look up a result by its key
    pub fn find(&self, key: &ResultKey) -> Option<&SearchResult> {
        self.section(key.provider)
            .results
            .iter()
            .find(|r| r.url == key.url)
    }

    /// Get total result count
    pub fn result_count(&self) -> usize {
        self.web.len() + self.neural.len() + self.news.len()
    }

    /// Whether a provider failed during this search
    pub fn failed(&self, provider: ProviderKind) -> bool {
        self.warnings.iter().any(|w| w.provider == provider)
    }
}
