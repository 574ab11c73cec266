//! Anti-forgery tokens bound to a session.
//!
//! Each session holds at most one live token. Mutating requests must echo it
//! back; after a successful mutation the token is rotated.

use crate::db::now_ms;
use crate::session::{SessionId, SessionStore, StoredToken};
use rand::RngCore;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Default token lifetime in seconds.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;

/// Form field carrying the token.
pub const TOKEN_FIELD: &str = "csrf_token";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsrfError {
    #[error("no token submitted")]
    Missing,
    #[error("no token issued for this session")]
    NoToken,
    #[error("token expired")]
    Expired,
    #[error("token mismatch")]
    Mismatch,
}

/// Issues and verifies per-session tokens against an injected store.
#[derive(Clone)]
pub struct CsrfGuard {
    store: Arc<dyn SessionStore>,
    ttl_ms: i64,
}

impl CsrfGuard {
    pub fn new(store: Arc<dyn SessionStore>, ttl_seconds: i64) -> Self {
        Self {
            store,
            ttl_ms: ttl_seconds.max(1) * 1000,
        }
    }

    /// The session's live token, or a newly issued one.
    pub fn current_or_issue(&self, session: &SessionId) -> String {
        self.current_or_issue_at(session, now_ms())
    }

    pub fn current_or_issue_at(&self, session: &SessionId, now: i64) -> String {
        match self.store.load(session) {
            Some(stored) if !stored.is_expired(now) => stored.token,
            _ => self.issue_at(session, now),
        }
    }

    /// Issue a new token, replacing any previous one.
    pub fn issue(&self, session: &SessionId) -> String {
        self.issue_at(session, now_ms())
    }

    pub fn issue_at(&self, session: &SessionId, now: i64) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        self.store.store(
            session,
            StoredToken {
                token: token.clone(),
                expires_at: now + self.ttl_ms,
            },
        );
        // Drop entries left behind by abandoned sessions.
        let purged = self.store.purge_expired(now);
        if purged > 0 {
            debug!(purged, "Purged expired sessions");
        }
        token
    }

    /// Alias for `issue`, used after a successful mutation.
    pub fn rotate(&self, session: &SessionId) -> String {
        self.issue(session)
    }

    /// Check a submitted token against the session's live token.
    pub fn verify(&self, session: &SessionId, submitted: Option<&str>) -> Result<(), CsrfError> {
        self.verify_at(session, submitted, now_ms())
    }

    pub fn verify_at(
        &self,
        session: &SessionId,
        submitted: Option<&str>,
        now: i64,
    ) -> Result<(), CsrfError> {
        let submitted = submitted
            .filter(|token| !token.is_empty())
            .ok_or(CsrfError::Missing)?;
        let stored = self.store.load(session).ok_or(CsrfError::NoToken)?;

        if stored.is_expired(now) {
            self.store.remove(session);
            return Err(CsrfError::Expired);
        }
        if !constant_time_eq(stored.token.as_bytes(), submitted.as_bytes()) {
            return Err(CsrfError::Mismatch);
        }
        Ok(())
    }
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
