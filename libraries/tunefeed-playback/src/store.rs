//! Playback state store
//!
//! Owns the single [`PlaybackState`] of the tab and mirrors every mutation
//! into [`SessionStorage`]. The store knows nothing about widgets: callers
//! hand it [`Snapshot`]s read from the registry.

use crate::clock::Timer;
use crate::config::CoordinatorConfig;
use crate::history::VideoHistory;
use crate::storage::{self, SessionStorage, STATE_KEY};
use crate::types::{ActiveVideo, Playback, PlaybackPatch, PlaybackState};
use crate::widget::Snapshot;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, warn};
use tunefeed_core::VideoRef;

/// Where a capture read on unregister ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTarget {
    /// The active, displayed video: written into `playback`
    Playback,
    /// An inactive video: written into its history entry
    History,
    /// A duplicate instance of the active video that is not displayed, or a
    /// late read from a video that was closed
    Discarded,
}

/// Tab-scoped playback state with persistence
pub struct PlaybackStore {
    state: PlaybackState,
    storage: Box<dyn SessionStorage>,
    history: VideoHistory,
    navigating: Timer,
    /// Closed videos; their late captures are dropped until they play again
    closed: BTreeSet<VideoRef>,
    /// Backwards time reports smaller than this are treated as jitter
    jitter_seconds: f64,
}

impl PlaybackStore {
    /// Create a store, restoring whatever `storage` holds
    ///
    /// Corrupt persisted state is discarded.
    pub fn new(storage: Box<dyn SessionStorage>, config: &CoordinatorConfig) -> Self {
        let mut store = Self {
            state: PlaybackState {
                playback: Playback::new(config.default_volume),
                ..PlaybackState::default()
            },
            storage,
            history: VideoHistory::default(),
            navigating: Timer::new(),
            closed: BTreeSet::new(),
            jitter_seconds: config.recovery_interval().as_secs_f64(),
        };
        store.restore();
        store
    }

    fn restore(&mut self) {
        match storage::load_state(self.storage.as_ref()) {
            Ok(Some(state)) => {
                info!(
                    "Restored playback session: video={:?} minimized={}",
                    state.active_video_ref().map(|v| v.as_str()),
                    state.is_minimized
                );
                self.state = state;
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Discarding unreadable playback state: {}", e);
                if let Err(e) = self.storage.remove_item(STATE_KEY) {
                    warn!("Failed to remove playback state: {}", e);
                }
            }
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn storage(&self) -> &dyn SessionStorage {
        self.storage.as_ref()
    }

    pub fn history(&self) -> &VideoHistory {
        &self.history
    }

    fn persist(&mut self) {
        if let Err(e) = storage::save_state(self.storage.as_mut(), &self.state) {
            warn!("Failed to persist playback state: {}", e);
        }
    }

    fn persist_time(&mut self, video_ref: &VideoRef, seconds: f64) {
        if let Err(e) = storage::save_video_time(self.storage.as_mut(), video_ref, seconds) {
            warn!("Failed to persist time for {}: {}", video_ref, e);
        }
    }

    /// Make `active` the live video
    ///
    /// `outgoing` is a capture of the previously active video's widget, if one
    /// could be read. Returns false when `active` was already the live video.
    pub fn set_active_video(&mut self, active: ActiveVideo, outgoing: Option<Snapshot>) -> bool {
        if self.state.is_active(&active.video_ref) {
            debug!("Video {} already active", active.video_ref);
            return false;
        }

        let previous = self.state.active_video.take();
        if let Some(previous) = &previous {
            let playback = &self.state.playback;
            let (time, playing) = match outgoing {
                Some(snapshot) => (
                    snapshot.current_time,
                    snapshot.state.playing_intent(playback.is_playing),
                ),
                None => (playback.current_time_seconds, playback.is_playing),
            };
            debug!(
                "Recording outgoing video {} at {:.2}s (playing={})",
                previous.video_ref, time, playing
            );
            self.history.record(previous.video_ref.clone(), time, playing);
            self.persist_time(&previous.video_ref, time);
        }

        info!("Active video: {}", active.video_ref);
        self.closed.remove(&active.video_ref);
        self.state.active_video = Some(active);
        self.state.playback = Playback {
            is_playing: true,
            current_time_seconds: 0.0,
            volume: self.state.playback.volume,
        };
        if !self.state.is_navigating {
            self.state.is_minimized = previous.is_some();
        }
        self.persist();
        true
    }

    /// Move the active video to the floating widget
    ///
    /// Playback intent is taken from `snapshot`; a buffering or unreadable
    /// widget counts as playing. Returns whether the minimized flag changed.
    pub fn minimize(&mut self, snapshot: Option<Snapshot>) -> bool {
        let Some(video_ref) = self.state.active_video_ref().cloned() else {
            return false;
        };

        let changed = !self.state.is_minimized;
        self.state.is_minimized = true;

        match snapshot {
            Some(snapshot) => {
                self.state.playback.current_time_seconds = snapshot.current_time;
                self.state.playback.is_playing = snapshot.state.playing_intent(true);
            }
            None => self.state.playback.is_playing = true,
        }
        let time = self.state.playback.current_time_seconds;
        self.persist_time(&video_ref, time);
        self.persist();

        if changed {
            debug!("Minimized {} at {:.2}s", video_ref, time);
        }
        changed
    }

    /// Show the active video inline again
    pub fn maximize(&mut self) -> bool {
        if !self.state.is_minimized {
            return false;
        }
        self.state.is_minimized = false;
        self.persist();
        true
    }

    /// End the session
    ///
    /// Drops the active video's history and removes every persisted key
    /// belonging to it. Returns the former active video.
    pub fn close(&mut self) -> Option<ActiveVideo> {
        let active = self.state.active_video.take()?;
        self.state.is_minimized = false;
        self.state.playback = Playback::new(self.state.playback.volume);
        self.history.remove(&active.video_ref);
        self.closed.insert(active.video_ref.clone());

        if let Err(e) = storage::clear_state(self.storage.as_mut(), Some(&active.video_ref)) {
            warn!("Failed to clear playback state: {}", e);
        }
        info!("Closed video {}", active.video_ref);
        Some(active)
    }

    /// Open (or restart) the navigating window
    ///
    /// Returns true when the flag was switched on.
    pub fn mark_navigating(&mut self, now: Duration, duration: Duration) -> bool {
        self.navigating.arm(now, duration);
        let changed = !self.state.is_navigating;
        self.state.is_navigating = true;
        changed
    }

    /// Close the navigating window once it has elapsed
    ///
    /// Returns true when the flag was switched off.
    pub fn expire_navigation(&mut self, now: Duration) -> bool {
        if self.navigating.fire(now) && self.state.is_navigating {
            self.state.is_navigating = false;
            return true;
        }
        false
    }

    /// Merge a partial playback update
    ///
    /// Returns whether anything changed.
    pub fn update_playback(&mut self, patch: PlaybackPatch) -> bool {
        let before = self.state.playback.clone();
        let playback = &mut self.state.playback;

        if let Some(is_playing) = patch.is_playing {
            playback.is_playing = is_playing;
        }
        if let Some(time) = patch.current_time_seconds {
            if time.is_finite() && time >= 0.0 {
                playback.current_time_seconds = time;
            }
        }
        if let Some(volume) = patch.volume {
            playback.volume = volume.min(100);
        }

        let changed = self.state.playback != before;
        if changed {
            self.persist();
        }
        changed
    }

    /// Apply a widget report to the transport state
    ///
    /// While playing, a time slightly behind the stored one is reporting
    /// jitter and is ignored.
    pub fn record_report(&mut self, current_time: Option<f64>, is_playing: bool) -> bool {
        let playback = &self.state.playback;
        let time = current_time.filter(|&time| {
            let behind = playback.current_time_seconds - time;
            !(playback.is_playing && behind > 0.0 && behind < self.jitter_seconds)
        });
        self.update_playback(PlaybackPatch {
            is_playing: Some(is_playing),
            current_time_seconds: time,
            volume: None,
        })
    }

    /// File a capture read from a widget that is going away
    ///
    /// `displayed` tells whether the widget was the one showing the video.
    pub fn record_capture(
        &mut self,
        video_ref: &VideoRef,
        displayed: bool,
        snapshot: Snapshot,
    ) -> CaptureTarget {
        if self.closed.contains(video_ref) {
            debug!("Dropping capture of closed video {}", video_ref);
            return CaptureTarget::Discarded;
        }
        if !self.state.is_active(video_ref) {
            let was_playing = snapshot.is_playing();
            self.history
                .record(video_ref.clone(), snapshot.current_time, was_playing);
            self.persist_time(video_ref, snapshot.current_time);
            return CaptureTarget::History;
        }
        if !displayed {
            return CaptureTarget::Discarded;
        }

        let is_playing = snapshot.state.playing_intent(self.state.playback.is_playing);
        self.update_playback(PlaybackPatch {
            is_playing: Some(is_playing),
            current_time_seconds: Some(snapshot.current_time),
            volume: None,
        });
        self.persist_time(video_ref, snapshot.current_time);
        CaptureTarget::Playback
    }

    /// Seed the active video's position from where it was last left
    ///
    /// Only applies while the stored position is still zero. The history
    /// entry is consumed so it cannot go stale while the video plays on.
    pub fn restore_resume_point(&mut self) -> bool {
        let Some(video_ref) = self.state.active_video_ref().cloned() else {
            return false;
        };
        if self.state.playback.current_time_seconds > 0.0 {
            return false;
        }

        let time = match self.history.remove(&video_ref) {
            Some(entry) => Some(entry.current_time_seconds),
            None => storage::load_video_time(self.storage.as_ref(), &video_ref)
                .unwrap_or_else(|e| {
                    warn!("Failed to read stored time for {}: {}", video_ref, e);
                    None
                }),
        };
        match time {
            Some(time) if time > 0.0 => {
                debug!("Resuming {} at {:.2}s", video_ref, time);
                self.update_playback(PlaybackPatch::time(time))
            }
            _ => false,
        }
    }

    /// Where `video_ref` was last left
    ///
    /// The in-memory history wins over the persisted per-video time.
    pub fn remembered_time(&self, video_ref: &VideoRef) -> Option<f64> {
        if let Some(entry) = self.history.get(video_ref) {
            return Some(entry.current_time_seconds);
        }
        match storage::load_video_time(self.storage.as_ref(), video_ref) {
            Ok(time) => time,
            Err(e) => {
                warn!("Failed to read stored time for {}: {}", video_ref, e);
                None
            }
        }
    }
}
