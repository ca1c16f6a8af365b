//! Credential gate
//!
//! A session becomes authenticated once a username/password pair matches
//! the configured one. Comparison runs in constant time over HMAC tags keyed
//! with a per-process random secret, and attempts are rate limited per
//! username.

use crate::config::{AuthSettings, LoginCredentials};
use crate::session::Session;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Login attempts between sweeps of idle limiter keys
const PRUNE_EVERY: u64 = 256;

/// Login failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("too many login attempts, try again later")]
    Throttled,
}

/// Checks login attempts against the configured credentials
pub struct CredentialGate {
    key: [u8; 32],
    username_tag: Vec<u8>,
    password_tag: Vec<u8>,
    limiter: DefaultKeyedRateLimiter<String>,
    attempts: AtomicU64,
}

impl CredentialGate {
    pub fn new(credentials: &LoginCredentials, max_attempts_per_minute: u32) -> Self {
        let quota = Quota::per_minute(
            NonZeroU32::new(max_attempts_per_minute).unwrap_or(NonZeroU32::MIN),
        );
        Self::with_quota(credentials, quota)
    }

    fn with_quota(credentials: &LoginCredentials, quota: Quota) -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill(&mut key);

        Self {
            username_tag: tag(&key, credentials.username.as_bytes()),
            password_tag: tag(&key, credentials.password.as_bytes()),
            key,
            limiter: RateLimiter::keyed(quota),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn from_settings(credentials: &LoginCredentials, auth: &AuthSettings) -> Self {
        Self::new(credentials, auth.max_attempts_per_minute)
    }

    /// Constant-time check of a username/password pair
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let user_ok = self.matches(username.as_bytes(), &self.username_tag);
        let pass_ok = self.matches(password.as_bytes(), &self.password_tag);
        // Both comparisons always run.
        user_ok & pass_ok
    }

    /// Authenticate `session` if the pair matches. A failed attempt leaves the
    /// session unchanged.
    pub fn authenticate(
        &self,
        session: &Session,
        username: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        if self.attempts.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            self.prune();
        }

        if self.limiter.check_key(&username.to_string()).is_err() {
            warn!(session = %session.id(), "login throttled");
            return Err(AuthError::Throttled);
        }

        if !self.verify(username, password) {
            warn!(session = %session.id(), "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        session.mark_authenticated();
        info!(session = %session.id(), "login accepted");
        Ok(())
    }

    /// Drop limiter state for usernames whose budget has fully refilled
    pub fn prune(&self) {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        debug!(before, after = self.limiter.len(), "pruned login limiter");
    }

    /// Usernames currently tracked by the limiter
    pub fn tracked_usernames(&self) -> usize {
        self.limiter.len()
    }

    fn matches(&self, candidate: &[u8], expected: &[u8]) -> bool {
        match HmacSha256::new_from_slice(&self.key) {
            Ok(mut mac) => {
                mac.update(candidate);
                mac.verify_slice(expected).is_ok()
            }
            Err(_) => false,
        }
    }
}

fn tag(key: &[u8], data: &[u8]) -> Vec<u8> {
    match HmacSha256::new_from_slice(key) {
        Ok(mut mac) => {
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(attempts: u32) -> CredentialGate {
        let credentials = LoginCredentials {
            username: "analyst".to_string(),
            password: "s3cret".to_string(),
        };
        CredentialGate::new(&credentials, attempts)
    }

    #[test]
    fn test_verify_exact_match_only() {
        let gate = gate(5);
        assert!(gate.verify("analyst", "s3cret"));
        assert!(!gate.verify("analyst", "s3cret "));
        assert!(!gate.verify("Analyst", "s3cret"));
        assert!(!gate.verify("analyst", ""));
        assert!(!gate.verify("", ""));
    }

    #[test]
    fn test_authenticate_sets_session_flag() {
        let gate = gate(5);
        let session = Session::default();

        assert_eq!(
            gate.authenticate(&session, "analyst", "wrong"),
            Err(AuthError::InvalidCredentials)
        );
        assert!(!session.is_authenticated());

        assert_eq!(gate.authenticate(&session, "analyst", "s3cret"), Ok(()));
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_attempts_are_throttled_per_username() {
        let gate = gate(3);
        let session = Session::default();

        for _ in 0..3 {
            assert_eq!(
                gate.authenticate(&session, "analyst", "wrong"),
                Err(AuthError::InvalidCredentials)
            );
        }
        assert_eq!(
            gate.authenticate(&session, "analyst", "s3cret"),
            Err(AuthError::Throttled)
        );
        assert!(!session.is_authenticated());

        // Other usernames have their own budget.
        assert_eq!(
            gate.authenticate(&session, "someone", "s3cret"),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn test_prune_forgets_refilled_usernames() {
        let credentials = LoginCredentials {
            username: "analyst".to_string(),
            password: "s3cret".to_string(),
        };
        let quota = Quota::with_period(std::time::Duration::from_millis(1))
            .unwrap()
            .allow_burst(NonZeroU32::new(3).unwrap());
        let gate = CredentialGate::with_quota(&credentials, quota);
        let session = Session::default();

        for i in 0..50 {
            let _ = gate.authenticate(&session, &format!("user-{}", i), "x");
        }
        assert_eq!(gate.tracked_usernames(), 50);

        std::thread::sleep(std::time::Duration::from_millis(20));
        gate.prune();
        assert_eq!(gate.tracked_usernames(), 0);
    }

    #[test]
    fn test_attempts_trigger_periodic_prune() {
        let credentials = LoginCredentials {
            username: "analyst".to_string(),
            password: "s3cret".to_string(),
        };
        let quota = Quota::with_period(std::time::Duration::from_millis(1))
            .unwrap()
            .allow_burst(NonZeroU32::new(3).unwrap());
        let gate = CredentialGate::with_quota(&credentials, quota);
        let session = Session::default();

        for i in 0..(PRUNE_EVERY - 1) {
            let _ = gate.authenticate(&session, &format!("user-{}", i), "x");
        }
        assert_eq!(gate.tracked_usernames() as u64, PRUNE_EVERY - 1);

        std::thread::sleep(std::time::Duration::from_millis(20));
        // This attempt sweeps the idle keys before adding its own.
        let _ = gate.authenticate(&session, "analyst", "x");
        assert_eq!(gate.tracked_usernames(), 1);
    }

    #[test]
    fn test_tags_differ_per_gate() {
        let a = gate(5);
        let b = gate(5);
        assert_ne!(a.password_tag, b.password_tag);
    }
}
