//! Error types for configuration, buffer construction, runs and trace export.

use std::io;

use thiserror::Error;

use crate::types::{Role, TaskIndex};

/// Invalid run parameters; raised before any thread is spawned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown mode '{0}'. Use: monitor | semaphore")]
    UnknownStrategy(String),
    #[error("producers must be > 0")]
    ZeroProducers,
    #[error("consumers must be > 0")]
    ZeroConsumers,
    #[error("target must be > 0")]
    ZeroTarget,
    #[error("capacity must be > 0")]
    ZeroCapacity,
}

/// Failure while constructing a buffer variant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("buffer capacity must be > 0")]
    ZeroCapacity,
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error("failed to spawn {role} thread {index}: {source}")]
    Spawn {
        role: Role,
        index: TaskIndex,
        #[source]
        source: io::Error,
    },
    #[error("{role} thread {index} panicked")]
    TaskPanicked { role: Role, index: TaskIndex },
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to write trace: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode trace: {0}")]
    Csv(#[from] csv::Error),
}
