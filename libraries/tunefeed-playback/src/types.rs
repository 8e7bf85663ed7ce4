//! Core types for video session coordination

use crate::error::PlaybackError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tunefeed_core::{PostRef, VideoRef};

/// The video currently considered "live"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveVideo {
    /// External video identifier
    pub video_ref: VideoRef,

    /// Post the video was started from
    pub owner_post_ref: PostRef,
}

impl ActiveVideo {
    pub fn new(video_ref: VideoRef, owner_post_ref: PostRef) -> Self {
        Self {
            video_ref,
            owner_post_ref,
        }
    }
}

/// Last known transport state
///
/// Authoritative only until the next reconciliation tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playback {
    /// Whether the video is intended to be playing
    pub is_playing: bool,

    /// Last known position in seconds
    pub current_time_seconds: f64,

    /// Volume (0-100)
    pub volume: u8,
}

impl Playback {
    /// Stopped transport at the start of a video
    pub fn new(volume: u8) -> Self {
        Self {
            is_playing: false,
            current_time_seconds: 0.0,
            volume: volume.min(100),
        }
    }
}

impl Default for Playback {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Partial update of [`Playback`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackPatch {
    pub is_playing: Option<bool>,
    pub current_time_seconds: Option<f64>,
    pub volume: Option<u8>,
}

impl PlaybackPatch {
    /// Patch only the position
    pub fn time(seconds: f64) -> Self {
        Self {
            current_time_seconds: Some(seconds),
            ..Self::default()
        }
    }

    /// Patch only the playing flag
    pub fn playing(is_playing: bool) -> Self {
        Self {
            is_playing: Some(is_playing),
            ..Self::default()
        }
    }
}

/// Tab-scoped playback session state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Video currently considered "live"
    pub active_video: Option<ActiveVideo>,

    /// Whether the active video is shown in the floating widget
    ///
    /// Always false while `active_video` is absent.
    pub is_minimized: bool,

    /// True for a short window after a route change
    pub is_navigating: bool,

    /// Last known transport state
    pub playback: Playback,
}

impl PlaybackState {
    /// Reference of the active video, if any
    pub fn active_video_ref(&self) -> Option<&VideoRef> {
        self.active_video.as_ref().map(|active| &active.video_ref)
    }

    /// Whether `video_ref` is the active video
    pub fn is_active(&self, video_ref: &VideoRef) -> bool {
        self.active_video_ref() == Some(video_ref)
    }

    /// Whether the active video is currently shown minimized
    pub fn is_active_and_minimized(&self) -> bool {
        self.active_video.is_some() && self.is_minimized
    }
}

/// Where a widget instance is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Inline in the page content (feed card, post detail)
    Inline,

    /// The floating widget
    Minimized,
}

/// Identifies one rendered widget instance
///
/// Rendered as `<videoRef>` for inline players and `min-<videoRef>` for the
/// floating one, so both may exist for the same video at once.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SlotKey {
    video_ref: VideoRef,
    placement: Placement,
}

const MINIMIZED_PREFIX: &str = "min-";

impl SlotKey {
    pub fn new(video_ref: VideoRef, placement: Placement) -> Self {
        Self {
            video_ref,
            placement,
        }
    }

    /// Slot of the inline player for `video_ref`
    pub fn inline(video_ref: VideoRef) -> Self {
        Self::new(video_ref, Placement::Inline)
    }

    /// Slot of the floating player for `video_ref`
    pub fn minimized(video_ref: VideoRef) -> Self {
        Self::new(video_ref, Placement::Minimized)
    }

    pub fn video_ref(&self) -> &VideoRef {
        &self.video_ref
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn is_minimized(&self) -> bool {
        self.placement == Placement::Minimized
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.placement {
            Placement::Inline => write!(f, "{}", self.video_ref),
            Placement::Minimized => write!(f, "{MINIMIZED_PREFIX}{}", self.video_ref),
        }
    }
}

impl FromStr for SlotKey {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (placement, id) = match s.strip_prefix(MINIMIZED_PREFIX) {
            Some(id) => (Placement::Minimized, id),
            None => (Placement::Inline, s),
        };
        if id.is_empty() {
            return Err(PlaybackError::InvalidSlotKey(s.to_string()));
        }
        Ok(Self::new(VideoRef::new(id), placement))
    }
}

impl From<SlotKey> for String {
    fn from(slot: SlotKey) -> Self {
        slot.to_string()
    }
}

impl TryFrom<String> for SlotKey {
    type Error = PlaybackError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// State reported by the embeddable widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    /// Video loaded but never started
    Cued,
}

impl WidgetState {
    /// Map the widget API's numeric state code
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Unstarted),
            0 => Some(Self::Ended),
            1 => Some(Self::Playing),
            2 => Some(Self::Paused),
            3 => Some(Self::Buffering),
            5 => Some(Self::Cued),
            _ => None,
        }
    }

    /// Numeric state code used by the widget API
    pub fn code(self) -> i32 {
        match self {
            Self::Unstarted => -1,
            Self::Ended => 0,
            Self::Playing => 1,
            Self::Paused => 2,
            Self::Buffering => 3,
            Self::Cued => 5,
        }
    }

    /// Playback has stopped and will not resume on its own
    pub fn is_stalled(self) -> bool {
        matches!(
            self,
            Self::Paused | Self::Ended | Self::Unstarted | Self::Cued
        )
    }

    /// Intended playing flag implied by this state
    ///
    /// Unstarted and cued widgets say nothing about intent, so `fallback` wins.
    pub fn playing_intent(self, fallback: bool) -> bool {
        match self {
            Self::Playing | Self::Buffering => true,
            Self::Paused | Self::Ended => false,
            Self::Unstarted | Self::Cued => fallback,
        }
    }
}

impl fmt::Display for WidgetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unstarted => "unstarted",
            Self::Ended => "ended",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Buffering => "buffering",
            Self::Cued => "cued",
        };
        f.write_str(name)
    }
}
