//! Run parameters and their validation.

use crate::buffer::Strategy;
use crate::error::ConfigError;

pub const DEFAULT_PRODUCERS: usize = 2;
pub const DEFAULT_CONSUMERS: usize = 2;
pub const DEFAULT_TARGET: u64 = 50;
pub const DEFAULT_CAPACITY: usize = 10;
// Pauses are drawn from 0..DEFAULT_JITTER_MS, i.e. 0-9 ms.
pub const DEFAULT_JITTER_MS: u64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub strategy: Strategy,
    pub producers: usize,
    pub consumers: usize,
    /// Number of items that must be delivered before the run stops.
    pub target: u64,
    pub capacity: usize,
    pub jitter_ms: u64,
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Monitor,
            producers: DEFAULT_PRODUCERS,
            consumers: DEFAULT_CONSUMERS,
            target: DEFAULT_TARGET,
            capacity: DEFAULT_CAPACITY,
            jitter_ms: DEFAULT_JITTER_MS,
            seed: None,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.producers == 0 {
            return Err(ConfigError::ZeroProducers);
        }
        if self.consumers == 0 {
            return Err(ConfigError::ZeroConsumers);
        }
        if self.target == 0 {
            return Err(ConfigError::ZeroTarget);
        }
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }

    /// Default trace file name, e.g. `events_monitor_P2_C2_N50.csv`.
    pub fn trace_file_name(&self) -> String {
        format!(
            "events_{}_P{}_C{}_N{}.csv",
            self.strategy, self.producers, self.consumers, self.target
        )
    }
}
