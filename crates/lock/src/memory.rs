use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::LockError;
use crate::lock::{DistributedLock, OwnerToken};

struct LockEntry {
    token: OwnerToken,
    expires_at: Instant,
}

impl LockEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Default)]
struct InMemoryLockState {
    entries: HashMap<String, LockEntry>,
    unavailable: bool,
}

/// Process-local [`DistributedLock`] for tests and single-node deployments.
///
/// Matches the Redis backend's observable behavior, including TTL expiry:
/// an expired entry counts as free for every operation, even if it has not
/// been swept from the map yet. Time comes from the tokio clock so tests
/// can pause and advance it.
#[derive(Clone, Default)]
pub struct InMemoryLock {
    state: Arc<RwLock<InMemoryLockState>>,
}

impl InMemoryLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a backend outage: every operation errors until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .unavailable = unavailable;
    }
}

fn backend_unavailable() -> LockError {
    LockError::Backend(redis::RedisError::from((
        redis::ErrorKind::Io,
        "lock backend unavailable",
    )))
}

#[async_trait]
impl DistributedLock for InMemoryLock {
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<Option<OwnerToken>, LockError> {
        let now = Instant::now();
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.unavailable {
            return Err(backend_unavailable());
        }

        if let Some(entry) = state.entries.get(key) {
            if !entry.is_expired(now) {
                return Ok(None);
            }
        }

        let token = OwnerToken::generate();
        state.entries.insert(
            key.to_string(),
            LockEntry {
                token: token.clone(),
                expires_at: now + ttl,
            },
        );
        Ok(Some(token))
    }

    async fn release(&self, key: &str, token: &OwnerToken) -> Result<bool, LockError> {
        let now = Instant::now();
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.unavailable {
            return Err(backend_unavailable());
        }

        match state.entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                state.entries.remove(key);
                Ok(false)
            }
            Some(entry) if entry.token == *token => {
                state.entries.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn extend(
        &self,
        key: &str,
        token: &OwnerToken,
        new_ttl: Duration,
    ) -> Result<bool, LockError> {
        let now = Instant::now();
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.unavailable {
            return Err(backend_unavailable());
        }

        match state.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) && entry.token == *token => {
                entry.expires_at = now + new_ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn is_locked(&self, key: &str) -> Result<bool, LockError> {
        let now = Instant::now();
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        if state.unavailable {
            return Err(backend_unavailable());
        }
        Ok(state
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now)))
    }
}
