use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::LockError;

/// Default lease applied when a caller has no better estimate of how long
/// the protected section runs.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(300);

/// Opaque proof of lock ownership handed out by [`DistributedLock::acquire`].
///
/// Release and extend only succeed when presented with the token minted by
/// the acquisition they refer to, so a holder can never tear down a lock
/// that expired and was re-acquired by someone else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerToken(String);

impl OwnerToken {
    /// Mints a fresh, unguessable token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OwnerToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Mutual exclusion on arbitrary string keys with a time-to-live.
///
/// Acquisition is non-blocking: a busy key reports `None` immediately and
/// the caller decides whether to retry or give up. Every lease expires on
/// its own after the TTL, so a crashed holder cannot wedge the key forever.
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Attempts to take the lock. Returns the owner token on success,
    /// `None` when the key is already held.
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<Option<OwnerToken>, LockError>;

    /// Releases the lock if `token` still owns it. Returns `true` when the
    /// lock was removed, `false` when the key was free or owned by another
    /// token. The check and the delete happen as one atomic step on the
    /// backend.
    async fn release(&self, key: &str, token: &OwnerToken) -> Result<bool, LockError>;

    /// Pushes the expiry of a held lock out to `new_ttl` from now, if
    /// `token` still owns it. Returns `false` when ownership was lost.
    async fn extend(
        &self,
        key: &str,
        token: &OwnerToken,
        new_ttl: Duration,
    ) -> Result<bool, LockError>;

    /// Reports whether the key is currently held by anyone.
    async fn is_locked(&self, key: &str) -> Result<bool, LockError>;
}
