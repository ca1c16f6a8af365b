//! Application state shared across handlers

use crate::auth::CredentialGate;
use crate::config::Settings;
use crate::search::Search;
use crate::session::{Session, SessionStore};
use axum::http::HeaderMap;
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the session token
pub const SESSION_HEADER: &str = "x-session-id";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Search executor
    pub search: Arc<Search>,
    /// Live sessions
    pub sessions: Arc<SessionStore>,
    /// Login checks
    pub gate: Arc<CredentialGate>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, search: Search) -> Self {
        let sessions = SessionStore::from_settings(&settings);
        let gate = CredentialGate::from_settings(&settings.credentials, &settings.auth);

        Self {
            settings: Arc::new(settings),
            search: Arc::new(search),
            sessions: Arc::new(sessions),
            gate: Arc::new(gate),
        }
    }

    /// Build the HTTP client, adapters and session store from settings
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let search = Search::from_settings(&settings)?;
        Ok(Self::new(settings, search))
    }

    /// Session named by the request's session header, if it exists
    pub fn session(&self, headers: &HeaderMap) -> Option<Arc<Session>> {
        let id = headers
            .get(SESSION_HEADER)?
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())?;
        self.sessions.get(&id)
    }
}
