use thiserror::Error;

/// Failures surfaced by a lock backend.
///
/// A backend error never means "the lock is held by someone else"; busy
/// locks are reported through the `Option` / `bool` returns on
/// [`crate::DistributedLock`]. Callers that see `LockError` must treat the
/// protected operation as not permitted rather than proceeding unlocked.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock backend unavailable: {0}")]
    Backend(#[from] redis::RedisError),
}
