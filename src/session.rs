//! Server-side session state, keyed by an opaque session id.

use rand::RngCore;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// Opaque session identifier carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// A fresh random id (128 bits, hex).
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Accept a client-supplied id only if it has the shape we hand out.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == 32 && raw.bytes().all(|b| b.is_ascii_hexdigit());
        valid.then(|| Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An anti-forgery token bound to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredToken {
    pub token: String,
    /// Unix milliseconds after which the token is no longer accepted.
    pub expires_at: i64,
}

impl StoredToken {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at
    }
}

/// Storage for per-session tokens.
pub trait SessionStore: Send + Sync {
    fn load(&self, session: &SessionId) -> Option<StoredToken>;

    fn store(&self, session: &SessionId, token: StoredToken);

    fn remove(&self, session: &SessionId);

    /// Drop every entry expired at `now_ms`. Returns how many were dropped.
    fn purge_expired(&self, now_ms: i64) -> usize;
}

/// Process-local session store.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<SessionId, StoredToken>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, session: &SessionId) -> Option<StoredToken> {
        self.entries.lock().ok()?.get(session).cloned()
    }

    fn store(&self, session: &SessionId, token: StoredToken) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(session.clone(), token);
        }
    }

    fn remove(&self, session: &SessionId) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(session);
        }
    }

    fn purge_expired(&self, now_ms: i64) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, token| !token.is_expired(now_ms));
        before - entries.len()
    }
}
