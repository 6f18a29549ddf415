pub mod error;
pub mod lock;
pub mod memory;
pub mod redis;

pub use error::LockError;
pub use lock::{DistributedLock, OwnerToken, DEFAULT_LOCK_TTL};
pub use memory::InMemoryLock;
pub use self::redis::RedisLock;
