use async_trait::async_trait;

use super::{CodeGenerator, GeneratorError, base62};

/// Key of the shared counter in the remote store.
pub const DEFAULT_COUNTER_KEY: &str = "url_counter";

/// An atomic, monotonically increasing counter shared by all front-ends.
///
/// # Implementations
///
/// - [`crate::infrastructure::counter::RedisCounter`] - Redis `INCR`
#[async_trait]
pub trait Counter: Send + Sync {
    /// Atomically increments `key` and returns the new value.
    async fn increment(&self, key: &str) -> Result<u64, GeneratorError>;
}

/// Allocates codes by base-62 encoding the next counter value.
///
/// Codes never collide as long as no other code space shares the counter key.
pub struct CounterGenerator<C: Counter> {
    counter: C,
    key: String,
}

impl<C: Counter> CounterGenerator<C> {
    pub fn new(counter: C) -> Self {
        Self::with_key(counter, DEFAULT_COUNTER_KEY)
    }

    pub fn with_key(counter: C, key: impl Into<String>) -> Self {
        Self {
            counter,
            key: key.into(),
        }
    }
}

#[async_trait]
impl<C: Counter> CodeGenerator for CounterGenerator<C> {
    async fn generate(&self, _long_url: &str, _attempt: u32) -> Result<String, GeneratorError> {
        let value = self.counter.increment(&self.key).await?;
        Ok(base62::encode(value))
    }
}
