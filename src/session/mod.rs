//! Per-user session state
//!
//! A session carries everything that must not leak between users: the
//! authenticated flag, the provider response cache and the selection set.

mod selection;

pub use selection::SelectionSet;

use crate::cache::ResultCache;
use crate::config::{CacheSettings, SessionSettings, Settings};
use crate::results::ResultKey;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

/// State of one logical user session
pub struct Session {
    id: Uuid,
    last_active: Mutex<Instant>,
    authenticated: AtomicBool,
    cache: ResultCache,
    selection: Mutex<SelectionSet>,
}

impl Session {
    /// Create an unauthenticated session with its own cache
    pub fn new(cache: ResultCache) -> Self {
        Self {
            id: Uuid::new_v4(),
            last_active: Mutex::new(Instant::now()),
            authenticated: AtomicBool::new(false),
            cache,
            selection: Mutex::new(SelectionSet::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Time since the session last served a request
    pub fn idle_for(&self) -> Duration {
        self.last_active().elapsed()
    }

    fn touch(&self) {
        *self.last_active.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    fn last_active(&self) -> Instant {
        *self.last_active.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    /// Set by the credential gate; lasts as long as the session
    pub(crate) fn mark_authenticated(&self) {
        self.authenticated.store(true, Ordering::Release);
    }

    /// This session's provider response cache
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Add or remove a key from the selection. Returns the new state.
    pub fn toggle_selection(&self, key: ResultKey) -> bool {
        self.selection().toggle(key)
    }

    pub fn is_selected(&self, key: &ResultKey) -> bool {
        self.selection().contains(key)
    }

    /// Selected keys in insertion order
    pub fn list_selected(&self) -> Vec<ResultKey> {
        self.selection().keys().to_vec()
    }

    fn selection(&self) -> MutexGuard<'_, SelectionSet> {
        // A panic while toggling cannot leave the set half-updated.
        self.selection.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ResultCache::default())
    }
}

/// All live sessions, by id
///
/// Sessions idle for longer than the idle timeout are dropped on lookup and
/// whenever a new session is created. At most `max_sessions` are kept; when
/// full, the longest idle session makes room.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    cache_settings: CacheSettings,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(cache_settings: CacheSettings, limits: SessionSettings) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            cache_settings,
            idle_timeout: Duration::from_secs(limits.idle_timeout_seconds),
            max_sessions: limits.max_sessions,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.cache.clone(), settings.sessions.clone())
    }

    /// Create and register a fresh, unauthenticated session
    pub fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new(ResultCache::from_settings(&self.cache_settings)));

        let mut sessions = self.write();
        let idle_timeout = self.idle_timeout;
        sessions.retain(|_, s| s.idle_for() < idle_timeout);

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .max_by_key(|(_, s)| s.idle_for())
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                    debug!(session = %id, "evicted idle session");
                }
                None => break,
            }
        }

        sessions.insert(session.id(), session.clone());
        session
    }

    /// Live session by id. A hit counts as activity; an expired session is
    /// dropped and reported as missing.
    pub fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        let session = self.read().get(id).cloned()?;
        if session.idle_for() >= self.idle_timeout {
            self.write().remove(id);
            debug!(session = %id, "session expired");
            return None;
        }
        session.touch();
        Some(session)
    }

    /// Drop a session; its selection and cache go with it
    pub fn remove(&self, id: &Uuid) -> Option<Arc<Session>> {
        self.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, Arc<Session>>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Arc<Session>>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(CacheSettings::default(), SessionSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderKind;

    #[test]
    fn test_new_session_is_unauthenticated() {
        let session = Session::default();
        assert!(!session.is_authenticated());
        session.mark_authenticated();
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_sessions_do_not_share_selection() {
        let store = SessionStore::default();
        let alice = store.create();
        let bob = store.create();
        assert_ne!(alice.id(), bob.id());

        let key = ResultKey::new(ProviderKind::Web, "https://apple.com");
        assert!(alice.toggle_selection(key.clone()));
        assert!(alice.is_selected(&key));
        assert!(!bob.is_selected(&key));
        assert!(bob.list_selected().is_empty());
    }

    #[test]
    fn test_remove_resets_session() {
        let store = SessionStore::default();
        let session = store.create();
        session.toggle_selection(ResultKey::new(ProviderKind::News, "https://x.com"));
        assert_eq!(store.len(), 1);

        assert!(store.remove(&session.id()).is_some());
        assert!(store.get(&session.id()).is_none());
        assert!(store.is_empty());

        let fresh = store.create();
        assert!(fresh.list_selected().is_empty());
    }

    #[test]
    fn test_idle_sessions_expire() {
        let mut store = SessionStore::default();
        store.idle_timeout = Duration::from_millis(50);
        let session = store.create();

        assert!(store.get(&session.id()).is_some());
        std::thread::sleep(Duration::from_millis(80));
        assert!(store.get(&session.id()).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_lookups_keep_session_alive() {
        let mut store = SessionStore::default();
        store.idle_timeout = Duration::from_millis(100);
        let session = store.create();

        for _ in 0..4 {
            std::thread::sleep(Duration::from_millis(40));
            assert!(store.get(&session.id()).is_some());
        }
    }

    #[test]
    fn test_full_store_evicts_longest_idle() {
        let store = SessionStore::new(
            CacheSettings::default(),
            SessionSettings {
                idle_timeout_seconds: 3600,
                max_sessions: 2,
            },
        );
        let first = store.create();
        std::thread::sleep(Duration::from_millis(5));
        let second = store.create();
        std::thread::sleep(Duration::from_millis(5));
        assert!(store.get(&first.id()).is_some());

        let third = store.create();
        assert_eq!(store.len(), 2);
        assert!(store.get(&first.id()).is_some());
        assert!(store.get(&second.id()).is_none());
        assert!(store.get(&third.id()).is_some());
    }
}
