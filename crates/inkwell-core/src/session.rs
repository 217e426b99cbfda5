//! Session manager for Inkwell.
//!
//! A session carries two things across requests: the signed-in username and
//! a one-shot flash message. Sessions live in process memory, keyed by the
//! SHA-256 of a random token; the plaintext token only ever exists in the
//! client's cookie.
//!
//! Handlers never touch the store directly. Each request gets a
//! [`SessionHandle`], a small context object bound to one session.
//!
//! Sessions are created lazily: a request without a cookie gets a handle
//! with a fresh token, but nothing is stored (and no cookie is issued) until
//! the handle first writes. Signing in moves the session to a new token.
//!
//! Idle sessions expire after a configurable TTL. Expiry is lazy: a stale
//! session is dropped when its token is next presented, and creating a
//! session sweeps out the others at most once per [`PURGE_INTERVAL_SECS`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "inkwell_session";

/// Minimum time between two sweeps of expired sessions.
pub const PURGE_INTERVAL_SECS: i64 = 60;

/// Per-client session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Signed-in username, if any.
    pub username: Option<String>,
    /// Message to show on the next rendered page.
    pub flash: Option<String>,
    /// Last time a request used this session.
    pub last_seen: DateTime<Utc>,
}

impl Session {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            username: None,
            flash: None,
            last_seen: now,
        }
    }
}

struct Sessions {
    entries: HashMap<String, Session>,
    last_purge: DateTime<Utc>,
}

/// In-memory store of all live sessions.
pub struct SessionStore {
    inner: RwLock<Sessions>,
    idle_ttl: Duration,
    purge_interval: Duration,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("idle_ttl", &self.idle_ttl)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create an empty store whose sessions expire after `idle_ttl` without
    /// a request.
    #[must_use]
    pub fn new(idle_ttl: Duration) -> Self {
        let purge_interval = idle_ttl.min(Duration::seconds(PURGE_INTERVAL_SECS));
        Self {
            inner: RwLock::new(Sessions {
                entries: HashMap::new(),
                last_purge: Utc::now(),
            }),
            idle_ttl,
            purge_interval,
        }
    }

    /// Resume the session for `token`, or bind a handle to a fresh token.
    ///
    /// A missing, unknown, or expired token yields a handle that stores
    /// nothing until it is first written to; see
    /// [`SessionHandle::pending_token`].
    pub async fn open(self: &Arc<Self>, token: Option<&str>) -> SessionHandle {
        if let Some(token) = token {
            let now = Utc::now();
            let key = hash_token(token);
            let mut inner = self.inner.write().await;
            let expired = inner.entries.get(&key).map(|s| self.is_expired(s, now));

            match expired {
                Some(false) => {
                    if let Some(session) = inner.entries.get_mut(&key) {
                        session.last_seen = now;
                    }
                    return SessionHandle::bind(self, key, token.to_owned(), false);
                }
                Some(true) => {
                    inner.entries.remove(&key);
                    debug!("expired session presented, starting a new one");
                }
                None => {}
            }
        }

        let token = new_token();
        SessionHandle::bind(self, hash_token(&token), token, true)
    }

    /// Look at a session without touching it.
    pub async fn get(&self, token: &str) -> Option<Session> {
        let inner = self.inner.read().await;
        inner.entries.get(&hash_token(token)).cloned()
    }

    /// Drop every session idle for longer than the TTL.
    ///
    /// Returns the number of sessions removed.
    pub async fn purge_expired(&self) -> usize {
        let mut inner = self.inner.write().await;
        self.purge_locked(&mut inner, Utc::now())
    }

    /// Number of sessions currently held.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Whether the store holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(session.last_seen) > self.idle_ttl
    }

    fn purge_locked(&self, inner: &mut Sessions, now: DateTime<Utc>) -> usize {
        let before = inner.entries.len();
        inner.entries.retain(|_, s| !self.is_expired(s, now));
        inner.last_purge = now;

        let removed = before.saturating_sub(inner.entries.len());
        if removed > 0 {
            debug!(removed, "purged expired sessions");
        }
        removed
    }

    /// Store a brand-new session, sweeping stale ones if a sweep is due.
    fn insert_locked(&self, inner: &mut Sessions, key: String, session: Session) {
        let now = session.last_seen;
        if now.signed_duration_since(inner.last_purge) >= self.purge_interval {
            self.purge_locked(inner, now);
        }
        inner.entries.insert(key, session);
    }

    async fn contains(&self, key: &str) -> bool {
        self.inner.read().await.entries.contains_key(key)
    }

    async fn read<R>(&self, key: &str, f: impl FnOnce(&Session) -> R) -> Option<R> {
        self.inner.read().await.entries.get(key).map(f)
    }

    /// Apply `f` to an existing session. Never creates one.
    async fn update<R>(&self, key: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.inner.write().await.entries.get_mut(key).map(f)
    }

    /// Apply `f` to the session, creating it first if needed.
    async fn upsert<R>(&self, key: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        if !inner.entries.contains_key(key) {
            self.insert_locked(&mut inner, key.to_owned(), Session::new(now));
        }
        let session = inner
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| Session::new(now));
        f(session)
    }

    /// Move the session at `old` (or a fresh one) to `new`, applying `f`.
    async fn rekey(&self, old: &str, new: String, f: impl FnOnce(&mut Session)) {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let mut session = inner
            .entries
            .remove(old)
            .unwrap_or_else(|| Session::new(now));
        session.last_seen = now;
        f(&mut session);
        self.insert_locked(&mut inner, new, session);
    }
}

struct Binding {
    key: String,
    token: String,
    /// The client does not hold this token yet.
    cookie_pending: bool,
}

/// The session bound to the current request.
///
/// Clones share the binding, so a token rotated by a handler is visible to
/// the middleware that issues the cookie.
#[derive(Clone)]
pub struct SessionHandle {
    store: Arc<SessionStore>,
    binding: Arc<RwLock<Binding>>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle").finish_non_exhaustive()
    }
}

impl SessionHandle {
    fn bind(store: &Arc<SessionStore>, key: String, token: String, cookie_pending: bool) -> Self {
        Self {
            store: Arc::clone(store),
            binding: Arc::new(RwLock::new(Binding {
                key,
                token,
                cookie_pending,
            })),
        }
    }

    /// Plaintext token currently bound to this handle.
    pub async fn token(&self) -> String {
        self.binding.read().await.token.clone()
    }

    /// The token to send to the client, if it needs one.
    ///
    /// `Some` only when the token is new to the client and the session has
    /// actually been stored.
    pub async fn pending_token(&self) -> Option<String> {
        let binding = self.binding.read().await;
        if binding.cookie_pending && self.store.contains(&binding.key).await {
            Some(binding.token.clone())
        } else {
            None
        }
    }

    /// The signed-in username, if any.
    pub async fn username(&self) -> Option<String> {
        let binding = self.binding.read().await;
        self.store
            .read(&binding.key, |s| s.username.clone())
            .await
            .flatten()
    }

    /// Record `username` as signed in, moving the session to a new token.
    pub async fn sign_in(&self, username: &str) {
        let mut binding = self.binding.write().await;
        let token = new_token();
        let key = hash_token(&token);

        self.store
            .rekey(&binding.key, key.clone(), |s| {
                s.username = Some(username.to_owned());
            })
            .await;

        binding.key = key;
        binding.token = token;
        binding.cookie_pending = true;
    }

    /// Forget the signed-in user. The flash message is kept.
    pub async fn sign_out(&self) {
        let binding = self.binding.read().await;
        self.store
            .update(&binding.key, |s| s.username = None)
            .await;
    }

    /// Set the message for the next rendered page, replacing any pending one.
    pub async fn set_flash(&self, message: impl Into<String>) {
        let message = message.into();
        let binding = self.binding.read().await;
        self.store
            .upsert(&binding.key, |s| s.flash = Some(message))
            .await;
    }

    /// Take the pending flash message. A second call returns `None`.
    pub async fn take_flash(&self) -> Option<String> {
        let binding = self.binding.read().await;
        self.store
            .update(&binding.key, |s| s.flash.take())
            .await
            .flatten()
    }
}

fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// SHA-256 a session token and return the hex-encoded hash.
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn make_store() -> Arc<SessionStore> {
        Arc::new(SessionStore::new(Duration::hours(1)))
    }

    #[tokio::test]
    async fn missing_token_stores_nothing_until_written() {
        let store = make_store();
        let handle = store.open(None).await;
        assert_eq!(handle.token().await.len(), 32);
        assert_eq!(handle.username().await, None);
        assert_eq!(handle.take_flash().await, None);
        handle.sign_out().await;

        assert!(store.is_empty().await);
        assert_eq!(handle.pending_token().await, None);

        handle.set_flash("hello").await;
        assert_eq!(store.len().await, 1);
        assert_eq!(handle.pending_token().await, Some(handle.token().await));
    }

    #[tokio::test]
    async fn anonymous_reads_never_grow_the_store() {
        let store = make_store();
        for _ in 0..100 {
            let handle = store.open(None).await;
            let _ = handle.username().await;
            let _ = handle.take_flash().await;
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn known_token_resumes_session() {
        let store = make_store();
        let first = store.open(None).await;
        first.sign_in("admin").await;

        let second = store.open(Some(&first.token().await)).await;
        assert_eq!(second.pending_token().await, None);
        assert_eq!(second.username().await.as_deref(), Some("admin"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_token_gets_fresh_token() {
        let store = make_store();
        let handle = store.open(Some("forged-token")).await;
        handle.set_flash("x").await;

        assert_ne!(handle.token().await, "forged-token");
        assert!(handle.pending_token().await.is_some());
        assert!(store.get("forged-token").await.is_none());
    }

    #[tokio::test]
    async fn sign_in_rotates_token() {
        let store = make_store();
        let handle = store.open(None).await;
        handle.set_flash("Invalid Credentials").await;
        let before = handle.token().await;

        // The client now holds `before`.
        let resumed = store.open(Some(&before)).await;
        resumed.sign_in("bill").await;
        let after = resumed.token().await;

        assert_ne!(before, after);
        assert!(store.get(&before).await.is_none());
        let session = store.get(&after).await.unwrap();
        assert_eq!(session.username.as_deref(), Some("bill"));
        assert_eq!(session.flash.as_deref(), Some("Invalid Credentials"));
        assert_eq!(resumed.pending_token().await, Some(after));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn rotation_is_shared_between_clones() {
        let store = make_store();
        let handle = store.open(None).await;
        let clone = handle.clone();
        clone.sign_in("admin").await;

        assert_eq!(handle.token().await, clone.token().await);
        assert_eq!(handle.username().await.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn flash_is_read_once() {
        let store = make_store();
        let handle = store.open(None).await;
        handle.set_flash("Welcome!").await;

        assert_eq!(handle.take_flash().await.as_deref(), Some("Welcome!"));
        assert_eq!(handle.take_flash().await, None);
    }

    #[tokio::test]
    async fn sign_out_keeps_flash() {
        let store = make_store();
        let handle = store.open(None).await;
        handle.sign_in("bill").await;
        handle.sign_out().await;
        handle.set_flash("You have been signed out.").await;

        let session = store.get(&handle.token().await).await.unwrap();
        assert_eq!(session.username, None);
        assert_eq!(session.flash.as_deref(), Some("You have been signed out."));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = make_store();
        let a = store.open(None).await;
        let b = store.open(None).await;
        a.sign_in("admin").await;

        assert_eq!(b.username().await, None);
        assert_ne!(a.token().await, b.token().await);
    }

    #[tokio::test]
    async fn expired_session_is_replaced() {
        let store = Arc::new(SessionStore::new(Duration::zero()));
        let old = store.open(None).await;
        old.sign_in("admin").await;
        let old_token = old.token().await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let resumed = store.open(Some(&old_token)).await;
        assert_ne!(resumed.token().await, old_token);
        assert_eq!(resumed.username().await, None);
        assert!(store.get(&old_token).await.is_none());
    }

    #[tokio::test]
    async fn new_session_sweeps_stale_ones() {
        let store = Arc::new(SessionStore::new(Duration::milliseconds(50)));
        store.open(None).await.set_flash("stale").await;
        tokio::time::sleep(std::time::Duration::from_millis(80)).await;

        let fresh = store.open(None).await;
        fresh.set_flash("fresh").await;

        assert_eq!(store.len().await, 1);
        assert!(store.get(&fresh.token().await).await.is_some());
        assert_eq!(store.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn sweeps_are_rate_limited() {
        let store = make_store();
        {
            let mut inner = store.inner.write().await;
            let idle_since = Utc::now() - Duration::hours(2);
            inner.entries.insert("stale".to_owned(), Session::new(idle_since));
            inner.last_purge = Utc::now();
        }

        // A sweep ran moments ago, so the stale entry survives this insert.
        store.open(None).await.set_flash("a").await;
        assert_eq!(store.len().await, 2);

        store.inner.write().await.last_purge =
            Utc::now() - Duration::seconds(PURGE_INTERVAL_SECS + 1);
        store.open(None).await.set_flash("b").await;

        let inner = store.inner.read().await;
        assert_eq!(inner.entries.len(), 2);
        assert!(!inner.entries.contains_key("stale"));
    }

    #[test]
    fn token_hash_is_hex_sha256() {
        let hash = hash_token("abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
