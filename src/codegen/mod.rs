//! Short code allocation.
//!
//! All allocators implement [`CodeGenerator`]; the URL service depends only on
//! that trait, so the choice between them is a deployment decision.
//!
//! - [`CounterGenerator`] - monotonic shared counter, never collides
//! - [`HashGenerator`] - truncated SHA-256 of the long URL, deterministic
//! - [`SnowflakeGenerator`] - timestamp, node id and sequence packed in 64 bits

pub mod base62;
pub mod clock;
pub mod counter;
pub mod hash;
pub mod snowflake;

use async_trait::async_trait;
use thiserror::Error;

pub use counter::{Counter, CounterGenerator};
pub use hash::HashGenerator;
pub use snowflake::{SnowflakeGenerator, SnowflakeSettings};

/// Errors raised by code allocators.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("counter backend failed: {0}")]
    Counter(String),

    #[error("clock moved backwards: last timestamp {last_ms}ms, now {now_ms}ms")]
    ClockRegression { last_ms: i64, now_ms: i64 },

    #[error("current time is before the configured epoch")]
    BeforeEpoch,

    #[error("timestamp no longer fits in 41 bits")]
    OverTimeLimit,

    #[error("invalid generator configuration: {0}")]
    InvalidConfig(String),
}

/// Produces candidate short codes.
///
/// `attempt` is the zero-based index of the current try within one shorten
/// request. Allocators that can collide may use it to vary their output;
/// the others ignore it.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    async fn generate(&self, long_url: &str, attempt: u32) -> Result<String, GeneratorError>;
}

/// Selects which allocator a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    Counter,
    Hash,
    Snowflake,
}

impl GeneratorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Hash => "hash",
            Self::Snowflake => "snowflake",
        }
    }
}

impl std::str::FromStr for GeneratorKind {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "counter" => Ok(Self::Counter),
            "hash" => Ok(Self::Hash),
            "snowflake" => Ok(Self::Snowflake),
            other => Err(GeneratorError::InvalidConfig(format!(
                "unknown generator '{other}', expected counter, hash or snowflake"
            ))),
        }
    }
}
