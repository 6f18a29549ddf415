use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use crate::error::LockError;
use crate::lock::{DistributedLock, OwnerToken};

const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

const EXTEND_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("EXPIRE", KEYS[1], ARGV[2])
else
    return 0
end
"#;

/// Redis-backed [`DistributedLock`].
///
/// Acquisition is a single `SET key token NX EX ttl`, so contending
/// processes on different hosts serialize on the Redis server. Release and
/// extend run server-side scripts that compare the stored token before
/// touching the key; the get-compare-delete sequence is atomic because
/// Redis executes each script without interleaving other commands.
pub struct RedisLock {
    client: redis::Client,
}

impl RedisLock {
    pub fn new(connection_string: &str) -> Result<Self, LockError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    // EX rejects 0, so sub-second TTLs round up to one second.
    fn ttl_seconds(ttl: Duration) -> u64 {
        ttl.as_secs().max(1)
    }
}

#[async_trait]
impl DistributedLock for RedisLock {
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<Option<OwnerToken>, LockError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let token = OwnerToken::generate();

        let outcome: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(token.as_str())
            .arg("NX")
            .arg("EX")
            .arg(Self::ttl_seconds(ttl))
            .query_async(&mut conn)
            .await?;

        if outcome.is_some() {
            metrics::counter!("resource_lock_acquisitions_total").increment(1);
            debug!(key, "acquired lock");
            Ok(Some(token))
        } else {
            metrics::counter!("resource_lock_contention_total").increment(1);
            debug!(key, "lock busy");
            Ok(None)
        }
    }

    async fn release(&self, key: &str, token: &OwnerToken) -> Result<bool, LockError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let script = redis::Script::new(RELEASE_SCRIPT);
        let deleted: i64 = script
            .key(key)
            .arg(token.as_str())
            .invoke_async(&mut conn)
            .await?;

        metrics::counter!("resource_lock_releases_total").increment(1);
        debug!(key, released = deleted == 1, "release lock");
        Ok(deleted == 1)
    }

    async fn extend(
        &self,
        key: &str,
        token: &OwnerToken,
        new_ttl: Duration,
    ) -> Result<bool, LockError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let script = redis::Script::new(EXTEND_SCRIPT);
        let extended: i64 = script
            .key(key)
            .arg(token.as_str())
            .arg(Self::ttl_seconds(new_ttl))
            .invoke_async(&mut conn)
            .await?;

        debug!(key, extended = extended == 1, "extend lock");
        Ok(extended == 1)
    }

    async fn is_locked(&self, key: &str) -> Result<bool, LockError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let held: bool = conn.exists(key).await?;
        Ok(held)
    }
}
