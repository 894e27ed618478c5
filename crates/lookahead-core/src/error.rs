//! Error types for the look-ahead queue and its picture buffers.

use thiserror::Error;

/// Main error type for look-ahead operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookaheadError {
    /// A picture buffer could not be allocated, either because the
    /// allocator refused or because the configured memory budget would be
    /// exceeded.
    #[error("Allocation failure: could not reserve {bytes} bytes")]
    AllocationFailure { bytes: usize },

    /// The queue holds as many frames as it can accept. Pop and retry.
    #[error("Look-ahead queue is full")]
    QueueFull,

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for look-ahead operations.
pub type Result<T> = std::result::Result<T, LookaheadError>;
