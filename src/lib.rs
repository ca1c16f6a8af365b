//! Company Search: authenticated company lookup across three search APIs
//!
//! A query is fanned out to a web-search provider (Serper), a neural search
//! provider (Exa) and a news provider (NewsAPI). Responses are cached per
//! session, merged into provider-namespaced result lists, and the user's
//! selection of results is tracked for the lifetime of the session.

pub mod auth;
pub mod cache;
pub mod config;
pub mod metrics;
pub mod network;
pub mod providers;
pub mod results;
pub mod search;
pub mod session;
pub mod web;

pub use auth::{AuthError, CredentialGate};
pub use config::Settings;
pub use providers::{Provider, ProviderError, ProviderKind, ProviderSet};
pub use results::{ProviderSection, ResultKey, SearchResult, SearchResults};
pub use search::{Search, SearchError, SearchQuery};
pub use session::{Session, SessionStore};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for provider requests in seconds
pub const DEFAULT_TIMEOUT: u64 = 15;

/// Maximum timeout that can be set
pub const MAX_TIMEOUT: u64 = 30;

/// Freshness window of cached provider responses in seconds
pub const DEFAULT_CACHE_TTL: u64 = 3600;
