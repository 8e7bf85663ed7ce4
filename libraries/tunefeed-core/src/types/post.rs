/// Post as seen by the player
use super::{PostRef, VideoRef};
use serde::{Deserialize, Serialize};

/// A shared music video post
///
/// Posts carry comments, likes and authorship in the data layer; the player
/// only needs to know which video a post shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Post identifier
    pub id: PostRef,

    /// Video shown by the post
    pub video_ref: VideoRef,

    /// Post title
    pub title: String,
}

impl Post {
    /// Create a new post
    pub fn new(id: PostRef, video_ref: VideoRef, title: impl Into<String>) -> Self {
        Self {
            id,
            video_ref,
            title: title.into(),
        }
    }

    /// Thumbnail URL for the post's video
    pub fn thumbnail_url(&self) -> String {
        format!(
            "https://img.youtube.com/vi/{}/mqdefault.jpg",
            self.video_ref.as_str()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_uses_camel_case_on_the_wire() {
        let post = Post::new(PostRef::new("1"), VideoRef::new("dQw4w9WgXcQ"), "Song");
        let json = serde_json::to_value(&post).unwrap();

        assert_eq!(json["videoRef"], "dQw4w9WgXcQ");
        assert_eq!(json["id"], "1");
    }

    #[test]
    fn thumbnail_points_at_video() {
        let post = Post::new(PostRef::new("1"), VideoRef::new("dQw4w9WgXcQ"), "Song");
        assert_eq!(
            post.thumbnail_url(),
            "https://img.youtube.com/vi/dQw4w9WgXcQ/mqdefault.jpg"
        );
    }
}
