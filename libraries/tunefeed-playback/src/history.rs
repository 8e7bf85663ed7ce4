//! Per-video position history
//!
//! Remembers where each previously active video was left so switching back
//! resumes it. Bounded: the least recently recorded video is forgotten first.

use std::collections::VecDeque;
use tunefeed_core::VideoRef;

/// Default number of videos remembered
pub const DEFAULT_HISTORY_SIZE: usize = 32;

/// Last known position of one video
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub video_ref: VideoRef,
    pub current_time_seconds: f64,
    pub was_playing: bool,
}

/// Bounded per-video history (most recent = back)
#[derive(Debug, Clone)]
pub struct VideoHistory {
    entries: VecDeque<HistoryEntry>,
    max_size: usize,
}

impl VideoHistory {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_size.min(DEFAULT_HISTORY_SIZE)),
            max_size: max_size.max(1),
        }
    }

    /// Record the position of `video_ref`, replacing any earlier entry
    pub fn record(&mut self, video_ref: VideoRef, current_time_seconds: f64, was_playing: bool) {
        self.remove(&video_ref);
        if self.entries.len() >= self.max_size {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            video_ref,
            current_time_seconds,
            was_playing,
        });
    }

    pub fn get(&self, video_ref: &VideoRef) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| &entry.video_ref == video_ref)
    }

    pub fn remove(&mut self, video_ref: &VideoRef) -> Option<HistoryEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| &entry.video_ref == video_ref)?;
        self.entries.remove(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for VideoHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}
