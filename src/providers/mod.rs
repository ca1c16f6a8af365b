//! Search provider module
//!
//! Defines the Provider trait and the three provider adapters a search fans
//! out to.

mod traits;

// Provider implementations
pub mod exa;
pub mod newsapi;
pub mod serper;

pub use traits::*;

use crate::config::Settings;
use std::sync::Arc;

/// One adapter per provider kind
#[derive(Clone)]
pub struct ProviderSet {
    pub web: Arc<dyn Provider>,
    pub neural: Arc<dyn Provider>,
    pub news: Arc<dyn Provider>,
}

impl ProviderSet {
    pub fn new(web: Arc<dyn Provider>, neural: Arc<dyn Provider>, news: Arc<dyn Provider>) -> Self {
        Self { web, neural, news }
    }

    /// Build the Serper, Exa and NewsAPI adapters from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            web: Arc::new(serper::Serper::from_settings(&settings.serper)),
            neural: Arc::new(exa::Exa::from_settings(&settings.exa)),
            news: Arc::new(newsapi::NewsApi::from_settings(&settings.newsapi)),
        }
    }

    /// Get the adapter of a provider kind
    pub fn get(&self, kind: ProviderKind) -> &Arc<dyn Provider> {
        match kind {
            ProviderKind::Web => &self.web,
            ProviderKind::Neural => &self.neural,
            ProviderKind::News => &self.news,
        }
    }

    /// All adapters, in display order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        ProviderKind::ALL.into_iter().map(move |kind| self.get(kind))
    }

    /// Get all provider names
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|p| p.name()).collect()
    }
}
