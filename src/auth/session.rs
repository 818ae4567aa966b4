//! Per-user-agent session storage.
//!
//! This module provides the [`SessionStore`] capability the authorization
//! flow reads and writes, an in-memory [`MemorySession`] for tests, and the
//! process-wide [`SessionRegistry`] that hands out [`SessionHandle`]s to the
//! HTTP layer.
//!
//! # Contents
//!
//! A session holds at most one pending state signature (under
//! [`keys::STATE_SIGNATURE`]) and at most one access token (under
//! [`keys::ACCESS_TOKEN`]). Absence of the token means "not logged in".
//!
//! Sessions live in memory only and are lost on restart.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::auth::oauth::token::token_url;

/// Well-known session keys.
pub mod keys {
    /// Signature of the nonce issued by the pending authorization.
    pub const STATE_SIGNATURE: &str = "oauth_state_signature";
    /// Access token obtained from the last successful exchange.
    pub const ACCESS_TOKEN: &str = "access_token";
}

/// An OAuth access token with masked debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a token value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw token for use in an `Authorization` header.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(*****)")
    }
}

/// Opaque key/value storage scoped to one user agent.
pub trait SessionStore: Send {
    /// Reads an entry.
    fn get(&self, key: &str) -> Option<String>;

    /// Writes an entry, replacing any previous value.
    fn set(&mut self, key: &str, value: String);

    /// Removes an entry if present.
    fn clear(&mut self, key: &str);

    /// Reads and removes an entry.
    fn take(&mut self, key: &str) -> Option<String> {
        let value = self.get(key);
        self.clear(key);
        value
    }

    /// Returns the stored access token, if logged in.
    fn access_token(&self) -> Option<AccessToken> {
        self.get(keys::ACCESS_TOKEN)
            .filter(|token| !token.is_empty())
            .map(AccessToken::new)
    }
}

/// A standalone in-memory session.
#[derive(Clone, Debug, Default)]
pub struct MemorySession {
    entries: HashMap<String, String>,
}

impl MemorySession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the session holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn clear(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[derive(Debug)]
struct SessionRecord {
    entries: HashMap<String, String>,
    last_seen: DateTime<Utc>,
}

impl SessionRecord {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            last_seen: Utc::now(),
        }
    }
}

/// Shared storage behind a registry and all of its handles.
struct Store {
    records: HashMap<String, SessionRecord>,
    idle_ttl: Duration,
    max_sessions: usize,
    last_sweep: DateTime<Utc>,
}

impl Store {
    fn is_expired(&self, record: &SessionRecord, now: DateTime<Utc>) -> bool {
        record.last_seen <= now - self.idle_ttl
    }

    /// Drops idle records, at most once per sweep interval.
    fn sweep_if_due(&mut self, now: DateTime<Utc>) {
        if now - self.last_sweep < Duration::seconds(SWEEP_INTERVAL_SECS) {
            return;
        }
        let cutoff = now - self.idle_ttl;
        self.records.retain(|_, record| record.last_seen > cutoff);
        self.last_sweep = now;
    }

    /// Returns the live record for `id`, removing it if it has expired.
    fn live_record(&mut self, id: &str, now: DateTime<Utc>) -> Option<&mut SessionRecord> {
        let expired = self
            .records
            .get(id)
            .is_some_and(|record| self.is_expired(record, now));
        if expired {
            self.records.remove(id);
            return None;
        }
        self.records.get_mut(id)
    }

    /// Persists a new record, evicting the least recently seen one at capacity.
    fn insert(&mut self, id: &str, now: DateTime<Utc>) -> &mut SessionRecord {
        self.sweep_if_due(now);
        if !self.records.contains_key(id) && self.records.len() >= self.max_sessions {
            let oldest = self
                .records
                .iter()
                .min_by_key(|(_, record)| record.last_seen)
                .map(|(oldest, _)| oldest.clone());
            if let Some(oldest) = oldest {
                tracing::warn!(
                    max_sessions = self.max_sessions,
                    "Session limit reached, evicting least recently used session"
                );
                self.records.remove(&oldest);
            }
        }
        self.records
            .entry(id.to_string())
            .or_insert_with(SessionRecord::new)
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("sessions", &self.records.len())
            .field("idle_ttl", &self.idle_ttl)
            .field("max_sessions", &self.max_sessions)
            .finish_non_exhaustive()
    }
}

type Shared = Arc<Mutex<Store>>;

fn lock(store: &Shared) -> MutexGuard<'_, Store> {
    // Entries are plain strings, a panic elsewhere cannot leave them half-written
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Minimum seconds between two full sweeps of idle sessions.
const SWEEP_INTERVAL_SECS: i64 = 60;

/// Process-wide registry of server-side sessions keyed by session id.
///
/// A session is only stored once something is written to it, so requests
/// that never touch their session cost nothing. At most `max_sessions`
/// are kept; beyond that the least recently seen session is evicted.
#[derive(Clone, Debug)]
pub struct SessionRegistry {
    store: Shared,
}

impl SessionRegistry {
    /// Entropy of generated session ids in bytes.
    pub const ID_ENTROPY: usize = 32;

    /// Default upper bound on stored sessions.
    pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

    /// Creates a registry with the default 24 hour idle lifetime.
    #[must_use]
    pub fn new() -> Self {
        Self::with_idle_ttl(Duration::hours(24))
    }

    /// Creates a registry evicting sessions idle for longer than `idle_ttl`.
    #[must_use]
    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            store: Arc::new(Mutex::new(Store {
                records: HashMap::new(),
                idle_ttl,
                max_sessions: Self::DEFAULT_MAX_SESSIONS,
                last_sweep: Utc::now(),
            })),
        }
    }

    /// Caps the number of stored sessions. A cap of zero is treated as one.
    #[must_use]
    pub fn with_max_sessions(self, max_sessions: usize) -> Self {
        lock(&self.store).max_sessions = max_sessions.max(1);
        self
    }

    /// Returns a handle to a new session with a random id.
    ///
    /// Nothing is stored until the first write through the handle.
    #[must_use]
    pub fn create(&self) -> SessionHandle {
        SessionHandle {
            id: token_url(Self::ID_ENTROPY),
            store: Arc::clone(&self.store),
        }
    }

    /// Opens an existing, non-expired session.
    #[must_use]
    pub fn open(&self, id: &str) -> Option<SessionHandle> {
        let now = Utc::now();
        let mut store = lock(&self.store);
        store.sweep_if_due(now);
        store.live_record(id, now)?.last_seen = now;
        Some(SessionHandle {
            id: id.to_string(),
            store: Arc::clone(&self.store),
        })
    }

    /// Returns the number of stored sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.store).records.len()
    }

    /// Returns `true` if no sessions are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle to one session inside a [`SessionRegistry`].
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    store: Shared,
}

impl SessionHandle {
    /// Returns the session id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle").finish_non_exhaustive()
    }
}

impl SessionStore for SessionHandle {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.store)
            .records
            .get(&self.id)
            .and_then(|record| record.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) {
        let now = Utc::now();
        let mut store = lock(&self.store);
        let record = store.insert(&self.id, now);
        record.entries.insert(key.to_string(), value);
        record.last_seen = now;
    }

    fn clear(&mut self, key: &str) {
        if let Some(record) = lock(&self.store).records.get_mut(&self.id) {
            record.entries.remove(key);
        }
    }
}

// Verify session types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SessionRegistry>();
    assert_send_sync::<SessionHandle>();
    assert_send_sync::<AccessToken>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_session_get_set_clear() {
        let mut session = MemorySession::new();
        assert!(session.get("k").is_none());

        session.set("k", "v1".to_string());
        session.set("k", "v2".to_string());
        assert_eq!(session.get("k").as_deref(), Some("v2"));

        session.clear("k");
        assert!(session.get("k").is_none());
        assert!(session.is_empty());
    }

    #[test]
    fn test_take_reads_and_removes() {
        let mut session = MemorySession::new();
        session.set(keys::STATE_SIGNATURE, "sig".to_string());
        assert_eq!(session.take(keys::STATE_SIGNATURE).as_deref(), Some("sig"));
        assert!(session.take(keys::STATE_SIGNATURE).is_none());
    }

    #[test]
    fn test_access_token_ignores_empty_value() {
        let mut session = MemorySession::new();
        assert!(session.access_token().is_none());

        session.set(keys::ACCESS_TOKEN, String::new());
        assert!(session.access_token().is_none());

        session.set(keys::ACCESS_TOKEN, "tok".to_string());
        assert_eq!(session.access_token(), Some(AccessToken::new("tok")));
    }

    #[test]
    fn test_access_token_debug_is_masked() {
        let token = AccessToken::new("gho_secret");
        assert_eq!(format!("{token:?}"), "AccessToken(*****)");
        assert_eq!(token.value(), "gho_secret");
    }

    #[test]
    fn test_registry_handles_share_storage() {
        let registry = SessionRegistry::new();
        let mut handle = registry.create();
        handle.set("k", "v".to_string());

        let reopened = registry.open(handle.id()).unwrap();
        assert_eq!(reopened.get("k").as_deref(), Some("v"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_isolates_sessions() {
        let registry = SessionRegistry::new();
        let mut a = registry.create();
        let b = registry.create();
        a.set(keys::ACCESS_TOKEN, "tok".to_string());

        assert_ne!(a.id(), b.id());
        assert!(b.access_token().is_none());
    }

    #[test]
    fn test_registry_rejects_unknown_id() {
        let registry = SessionRegistry::new();
        assert!(registry.open("never-issued").is_none());
    }

    #[test]
    fn test_registry_sweeps_idle_sessions() {
        let registry = SessionRegistry::with_idle_ttl(Duration::zero());
        let mut handle = registry.create();
        handle.set("k", "v".to_string());

        assert!(registry.open(handle.id()).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_created_session_is_not_stored_until_written() {
        let registry = SessionRegistry::new();
        let handle = registry.create();

        assert!(registry.is_empty());
        assert!(handle.get("k").is_none());
        assert!(registry.open(handle.id()).is_none());
    }

    #[test]
    fn test_registry_is_bounded_and_keeps_newest() {
        let registry = SessionRegistry::new().with_max_sessions(3);
        let mut handles = Vec::new();
        for i in 0..10 {
            let mut handle = registry.create();
            handle.set(keys::STATE_SIGNATURE, format!("sig-{i}"));
            handles.push(handle);
        }

        assert_eq!(registry.len(), 3);
        let newest = handles.last().unwrap();
        let reopened = registry.open(newest.id()).unwrap();
        assert_eq!(reopened.get(keys::STATE_SIGNATURE).as_deref(), Some("sig-9"));
    }

    #[test]
    fn test_writes_to_existing_session_do_not_evict() {
        let registry = SessionRegistry::new().with_max_sessions(2);
        let mut a = registry.create();
        let mut b = registry.create();
        a.set("k", "1".to_string());
        b.set("k", "1".to_string());

        a.set("k", "2".to_string());
        assert_eq!(registry.len(), 2);
        assert_eq!(b.get("k").as_deref(), Some("1"));
    }

    #[test]
    fn test_zero_cap_is_treated_as_one() {
        let registry = SessionRegistry::new().with_max_sessions(0);
        let mut handle = registry.create();
        handle.set("k", "v".to_string());
        assert_eq!(registry.len(), 1);
    }
}
