use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

use super::clock::{Clock, SystemClock};
use super::{CodeGenerator, GeneratorError, base62};

const NODE_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;
const TIMESTAMP_BITS: u32 = 41;

pub const MAX_NODE_ID: u16 = (1 << NODE_BITS) - 1;
const MAX_SEQUENCE: u16 = (1 << SEQUENCE_BITS) - 1;
const MAX_TIMESTAMP: i64 = (1 << TIMESTAMP_BITS) - 1;

/// 2020-01-01T00:00:00Z in milliseconds.
pub const DEFAULT_EPOCH_MS: i64 = 1_577_836_800_000;

/// Configures a snowflake generator.
#[derive(Debug, Clone, Copy)]
pub struct SnowflakeSettings {
    /// Node index in `0..=1023`, unique per front-end.
    pub node_id: u16,
    /// Zero point of the 41-bit millisecond timestamp.
    pub epoch_ms: i64,
}

impl Default for SnowflakeSettings {
    fn default() -> Self {
        Self {
            node_id: 0,
            epoch_ms: DEFAULT_EPOCH_MS,
        }
    }
}

#[derive(Debug)]
struct GeneratorState {
    last_ts: i64,
    sequence: u16,
}

/// Snowflake-style allocator: `ts(41) | node(10) | sequence(12)`, base-62 encoded.
///
/// Ids are strictly increasing per generator. When the 4096 ids of one
/// millisecond are used up, the generator waits for the next millisecond on
/// the async timer, outside the state lock.
/// A clock that moves backwards is reported as an error rather than papered over.
pub struct SnowflakeGenerator<C: Clock = SystemClock> {
    node_id: u16,
    epoch_ms: i64,
    clock: C,
    state: Mutex<GeneratorState>,
}

impl SnowflakeGenerator<SystemClock> {
    pub fn new(settings: SnowflakeSettings) -> Result<Self, GeneratorError> {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock> SnowflakeGenerator<C> {
    pub fn with_clock(settings: SnowflakeSettings, clock: C) -> Result<Self, GeneratorError> {
        if settings.node_id > MAX_NODE_ID {
            return Err(GeneratorError::InvalidConfig(format!(
                "node id must be at most {MAX_NODE_ID}, got {}",
                settings.node_id
            )));
        }

        Ok(Self {
            node_id: settings.node_id,
            epoch_ms: settings.epoch_ms,
            clock,
            state: Mutex::new(GeneratorState {
                last_ts: -1,
                sequence: 0,
            }),
        })
    }

    /// Returns the next raw 64-bit id.
    ///
    /// When the current millisecond is used up, waits on the clock for the
    /// next one. The state lock is not held while waiting.
    pub async fn next_id(&self) -> Result<u64, GeneratorError> {
        loop {
            if let Some(id) = self.try_next_id()? {
                return Ok(id);
            }
            self.clock.sleep(Duration::from_millis(1)).await;
        }
    }

    /// Allocates an id in the current millisecond, or `None` if its 4096
    /// sequence numbers are used up. State is left untouched on `None`.
    fn try_next_id(&self) -> Result<Option<u64>, GeneratorError> {
        let mut state = self.state.lock();

        let ts = self.elapsed()?;
        if ts < state.last_ts {
            return Err(GeneratorError::ClockRegression {
                last_ms: state.last_ts + self.epoch_ms,
                now_ms: ts + self.epoch_ms,
            });
        }

        let sequence = if ts == state.last_ts {
            let next = (state.sequence + 1) & MAX_SEQUENCE;
            if next == 0 {
                return Ok(None);
            }
            next
        } else {
            0
        };

        if ts > MAX_TIMESTAMP {
            return Err(GeneratorError::OverTimeLimit);
        }

        state.last_ts = ts;
        state.sequence = sequence;

        Ok(Some(
            ((ts as u64) << (NODE_BITS + SEQUENCE_BITS))
                | (u64::from(self.node_id) << SEQUENCE_BITS)
                | u64::from(sequence),
        ))
    }

    fn elapsed(&self) -> Result<i64, GeneratorError> {
        let ts = self.clock.now_millis() - self.epoch_ms;
        if ts < 0 {
            return Err(GeneratorError::BeforeEpoch);
        }
        Ok(ts)
    }
}

#[async_trait]
impl<C: Clock> CodeGenerator for SnowflakeGenerator<C> {
    async fn generate(&self, _long_url: &str, _attempt: u32) -> Result<String, GeneratorError> {
        self.next_id().await.map(base62::encode)
    }
}
