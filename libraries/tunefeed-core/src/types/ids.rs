/// ID types for Tunefeed entities
use crate::error::{CoreError, Result};
use crate::video_link::{extract_video_id, is_valid_video_id};
use serde::{Deserialize, Serialize};
use std::fmt;

/// External video identifier (the YouTube video id)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoRef(String);

impl VideoRef {
    /// Create a video reference without validating it
    ///
    /// Ids coming back from storage were validated when the post was created.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a video reference from a bare id, rejecting malformed ids
    pub fn parse(id: &str) -> Result<Self> {
        let id = id.trim();
        if is_valid_video_id(id) {
            Ok(Self(id.to_string()))
        } else {
            Err(CoreError::InvalidVideoId(id.to_string()))
        }
    }

    /// Extract the video reference from a pasted YouTube link or bare id
    pub fn from_link(link: &str) -> Result<Self> {
        extract_video_id(link).map(Self)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VideoRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Post identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostRef(String);

impl PostRef {
    /// Create a new post ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PostRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
