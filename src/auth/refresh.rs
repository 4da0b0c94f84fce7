//! Tracking of the single live refresh token per user.
//!
//! The store deliberately has no expiry logic: expiry belongs to the token
//! codec at verification time. The store exists purely to detect reuse of a
//! rotated-out token: presenting a refresh token that no longer matches
//! the stored value is rejected even if it is cryptographically valid.

use std::collections::HashMap;
use std::sync::RwLock;

/// Maps a username to its currently-valid refresh token string.
///
/// `put` overwrites any prior value (last-writer-wins); two concurrent
/// logins for one username race benignly and the loser's token is dead on
/// arrival. An injected dependency rather than process-wide state so a
/// multi-instance deployment can swap in an externalized implementation.
pub trait RefreshStore: Send + Sync {
    fn put(&self, username: &str, token: &str);
    fn get(&self, username: &str) -> Option<String>;
}

/// In-memory implementation for a single-instance deployment.
#[derive(Default)]
pub struct InMemoryRefreshStore {
    inner: RwLock<HashMap<String, String>>,
}

impl InMemoryRefreshStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefreshStore for InMemoryRefreshStore {
    fn put(&self, username: &str, token: &str) {
        self.inner
            .write()
            .expect("refresh store lock poisoned")
            .insert(username.to_string(), token.to_string());
    }

    fn get(&self, username: &str) -> Option<String> {
        self.inner
            .read()
            .expect("refresh store lock poisoned")
            .get(username)
            .cloned()
    }
}
