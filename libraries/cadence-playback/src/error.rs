//! Error types for playback control

use thiserror::Error;

/// Playback errors
///
/// None of these are fatal to the controller: every failure either aborts a
/// single attempt or resolves into advancing/stopping the queue.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// `play` was given an index outside the queue
    #[error("Index out of range: {index} (queue length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// The pre-play validation hook rejected the item
    #[error("Validation failed for item {index}: {reason}")]
    ValidationFailed { index: usize, reason: String },

    /// The primitive reported an error or the load stalled
    #[error("Playback failed at position {position}: {reason}")]
    PlaybackFailed { position: usize, reason: String },

    /// Seek fraction outside [0, 1]
    #[error("Invalid seek fraction: {0}")]
    InvalidSeekFraction(f64),

    /// Configuration rejected at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The player service task is gone
    #[error("Player service closed")]
    ServiceClosed,
}

impl PlaybackError {
    /// Create a validation failure
    pub fn validation(index: usize, reason: impl Into<String>) -> Self {
        Self::ValidationFailed {
            index,
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
