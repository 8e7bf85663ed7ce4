//! Domain types

mod ids;
mod post;

pub use ids::{PostRef, VideoRef};
pub use post::Post;
