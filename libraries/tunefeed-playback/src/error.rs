//! Error types for video session coordination

use thiserror::Error;

/// Playback coordination errors
///
/// None of these are fatal to the session: widget failures are logged where
/// they happen and the recovery loop reconciles on its next tick.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// A widget call arrived before the widget reported ready
    #[error("Widget not ready: {0}")]
    WidgetNotReady(String),

    /// A widget method failed
    #[error("Widget call `{op}` failed: {message}")]
    WidgetCall { op: String, message: String },

    /// A call was made on a widget that was already destroyed
    #[error("Widget already destroyed: {0}")]
    StaleHandle(String),

    /// The embeddable widget API has not been loaded yet
    #[error("Widget API not loaded")]
    WidgetApiUnavailable,

    /// Slot key could not be parsed
    #[error("Invalid slot key: {0}")]
    InvalidSlotKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Per-tab storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Persisted state could not be encoded or decoded
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Domain error
    #[error(transparent)]
    Core(#[from] tunefeed_core::CoreError),
}

impl PlaybackError {
    /// Create a widget call error
    pub fn widget_call(op: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WidgetCall {
            op: op.into(),
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

/// Result type for playback coordination
pub type Result<T> = std::result::Result<T, PlaybackError>;
