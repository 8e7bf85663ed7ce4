//! Simulator error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Script error: {0}")]
    Script(String),

    /// A step referenced a widget the page never rendered
    #[error("Unknown widget in step {step}: {slot}")]
    UnknownWidget { step: usize, slot: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Playback error: {0}")]
    Playback(#[from] tunefeed_playback::PlaybackError),
}
