//! Redis-backed atomic counter for sequential code allocation.

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use std::time::Duration;
use tokio::time::timeout;

use crate::codegen::{Counter, GeneratorError};

/// Atomic counter backed by Redis `INCR`.
///
/// Keys are used as given, without the cache namespace, so every instance
/// sharing the Redis database draws from the same sequence.
pub struct RedisCounter {
    client: ConnectionManager,
    op_timeout: Duration,
}

impl RedisCounter {
    pub fn new(client: ConnectionManager, op_timeout: Duration) -> Self {
        Self { client, op_timeout }
    }
}

#[async_trait]
impl Counter for RedisCounter {
    async fn increment(&self, key: &str) -> Result<u64, GeneratorError> {
        let mut conn = self.client.clone();

        match timeout(self.op_timeout, conn.incr::<_, _, u64>(key, 1u64)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(GeneratorError::Counter(e.to_string())),
            Err(_) => Err(GeneratorError::Counter(format!(
                "INCR {key} timed out after {:?}",
                self.op_timeout
            ))),
        }
    }
}
