//! YouTube link parsing
//!
//! Admins paste whatever YouTube link their browser gave them. Accepted shapes:
//! - `https://www.youtube.com/watch?v=ID` (extra query parameters ignored)
//! - `https://youtu.be/ID`
//! - `https://www.youtube.com/embed/ID`, `/v/ID`, `/shorts/ID`, `/live/ID`
//! - `https://www.youtube-nocookie.com/embed/ID`
//! - a bare `ID`
//!
//! The scheme may be omitted.

use crate::error::{CoreError, Result};
use url::Url;

/// Length of a YouTube video id
pub const VIDEO_ID_LEN: usize = 11;

/// Path prefixes that are followed by the video id
const ID_PATH_PREFIXES: [&str; 4] = ["embed", "v", "shorts", "live"];

/// Check whether `id` has the shape of a YouTube video id
pub fn is_valid_video_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Extract the video id from a YouTube link or a bare id
pub fn extract_video_id(link: &str) -> Result<String> {
    let link = link.trim();
    if link.is_empty() {
        return Err(CoreError::invalid_input("empty video link"));
    }

    if is_valid_video_id(link) {
        return Ok(link.to_string());
    }

    let url = parse_lenient(link).ok_or_else(|| CoreError::InvalidVideoLink(link.to_string()))?;
    let host = url
        .host_str()
        .map(normalize_host)
        .ok_or_else(|| CoreError::InvalidVideoLink(link.to_string()))?;

    let candidate = match host.as_str() {
        "youtu.be" => first_segment(&url),
        "youtube.com" | "youtube-nocookie.com" => {
            if url.path() == "/watch" {
                url.query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned())
            } else {
                prefixed_segment(&url)
            }
        }
        _ => return Err(CoreError::InvalidVideoLink(link.to_string())),
    };

    match candidate {
        Some(id) if is_valid_video_id(&id) => Ok(id),
        Some(id) => Err(CoreError::InvalidVideoId(id)),
        None => Err(CoreError::InvalidVideoLink(link.to_string())),
    }
}

/// Parse a URL, retrying with an `https://` scheme when it was left out
fn parse_lenient(link: &str) -> Option<Url> {
    match Url::parse(link) {
        Ok(url) if url.has_host() => Some(url),
        _ => Url::parse(&format!("https://{link}")).ok(),
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    for prefix in ["www.", "m.", "music."] {
        if let Some(stripped) = host.strip_prefix(prefix) {
            return stripped.to_string();
        }
    }
    host
}

fn first_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

fn prefixed_segment(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?.filter(|segment| !segment.is_empty());
    let prefix = segments.next()?;
    if ID_PATH_PREFIXES.contains(&prefix) {
        segments.next().map(str::to_string)
    } else {
        None
    }
}
