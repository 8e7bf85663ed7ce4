/// Core error types for Tunefeed
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for Tunefeed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The text is not a recognizable YouTube link
    #[error("Not a YouTube link: {0}")]
    InvalidVideoLink(String),

    /// The extracted id does not look like a YouTube video id
    #[error("Invalid video id: {0}")]
    InvalidVideoId(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CoreError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
