//! Tunefeed Core
//!
//! Domain types shared by every Tunefeed crate.
//!
//! The video session coordinator only needs to know "which video belongs to
//! which post", so this crate stays small:
//! - **Identifiers**: `VideoRef`, `PostRef`
//! - **Posts**: the slice of a post the player cares about
//! - **Video links**: turning a pasted YouTube link into a `VideoRef`
//!
//! # Example
//!
//! ```rust
//! use tunefeed_core::{Post, PostRef, VideoRef};
//!
//! let video = VideoRef::from_link("https://youtu.be/dQw4w9WgXcQ").unwrap();
//! let post = Post::new(PostRef::new("42"), video.clone(), "Never Gonna Give You Up");
//!
//! assert_eq!(post.video_ref, video);
//! assert_eq!(video.as_str(), "dQw4w9WgXcQ");
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod types;
mod video_link;

pub use error::{CoreError, Result};
pub use types::{Post, PostRef, VideoRef};
pub use video_link::{extract_video_id, is_valid_video_id, VIDEO_ID_LEN};
