//! Bounded FIFO buffer contract and its two synchronization strategies.

mod monitor;
mod ring;
mod semaphore;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{BufferError, ConfigError};
use crate::types::Item;

pub use monitor::MonitorBuffer;
pub use semaphore::SemaphoreBuffer;

/// Blocking bounded buffer shared by producer and consumer threads.
pub trait BoundedBuffer: Send + Sync {
    /// Block until a slot is free, then append `item`.
    ///
    /// Returns the item back if the buffer was closed before it could be stored.
    fn put(&self, item: Item) -> Result<(), Item>;

    /// Block until an item is available, then remove the oldest one.
    ///
    /// Returns `None` once the buffer is closed and drained.
    fn get(&self) -> Option<Item>;

    /// Mark the buffer closed and wake every blocked caller.
    fn close(&self);

    /// Current number of stored items.
    fn len(&self) -> usize;

    fn capacity(&self) -> usize;

    /// Peak number of stored items over the buffer's lifetime.
    fn max_occupancy(&self) -> usize;

    fn strategy(&self) -> Strategy;
}

/// Synchronization discipline used by a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Monitor,
    Semaphore,
}

impl Strategy {
    #[cfg(test)]
    pub const ALL: [Strategy; 2] = [Strategy::Monitor, Strategy::Semaphore];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Monitor => "monitor",
            Strategy::Semaphore => "semaphore",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monitor" => Ok(Strategy::Monitor),
            "semaphore" => Ok(Strategy::Semaphore),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Construct the buffer variant for `strategy`.
pub fn build(strategy: Strategy, capacity: usize) -> Result<Arc<dyn BoundedBuffer>, BufferError> {
    let buffer: Arc<dyn BoundedBuffer> = match strategy {
        Strategy::Monitor => Arc::new(MonitorBuffer::new(capacity)?),
        Strategy::Semaphore => Arc::new(SemaphoreBuffer::new(capacity)?),
    };
    Ok(buffer)
}
