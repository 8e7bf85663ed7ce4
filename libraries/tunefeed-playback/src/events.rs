//! Session Events
//!
//! Event-based communication for UI synchronization. The coordinator queues
//! events as it mutates state; the UI drains them after each call or poll:
//! - Active video and placement changes (render or hide the floating widget)
//! - Widget lifecycle (created, registered, destroyed)
//! - Recovery activity (diagnostics only)

use crate::types::{SlotKey, WidgetState};
use serde::{Deserialize, Serialize};
use tunefeed_core::VideoRef;

/// Events emitted by the session coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A different video became active
    ActiveVideoChanged {
        video_ref: VideoRef,
        previous: Option<VideoRef>,
    },

    /// The active video moved between inline and floating placement
    MinimizedChanged { minimized: bool },

    /// The navigating window opened or closed
    NavigatingChanged { navigating: bool },

    /// Transport state changed (from a widget report or a snapshot)
    PlaybackUpdated {
        is_playing: bool,
        current_time_seconds: f64,
    },

    /// The floating widget was created; the platform reports ready later
    WidgetCreated { slot: SlotKey },

    /// A widget was torn down by the coordinator
    WidgetDestroyed { slot: SlotKey },

    /// A widget instance was added to the registry
    PlayerRegistered { slot: SlotKey },

    /// A widget instance left the registry
    PlayerUnregistered { slot: SlotKey },

    /// A widget reported a state change
    WidgetStateChanged { slot: SlotKey, state: WidgetState },

    /// The recovery loop reissued `play()`
    RecoveryPlay { attempt: u32 },

    /// The recovery loop started backing off
    RecoveryBackoff { attempts: u32 },

    /// The recovery loop tried to unstick a long buffering period
    BufferingRecovery { current_time_seconds: f64 },

    /// The widget reported an error
    WidgetError { slot: SlotKey, code: i32, hard: bool },

    /// `play()` was reissued after a widget error
    ErrorRetry { code: i32 },

    /// The session was closed
    Closed { video_ref: VideoRef },
}

impl SessionEvent {
    /// Short event name, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::ActiveVideoChanged { .. } => "active_video_changed",
            Self::MinimizedChanged { .. } => "minimized_changed",
            Self::NavigatingChanged { .. } => "navigating_changed",
            Self::PlaybackUpdated { .. } => "playback_updated",
            Self::WidgetCreated { .. } => "widget_created",
            Self::WidgetDestroyed { .. } => "widget_destroyed",
            Self::PlayerRegistered { .. } => "player_registered",
            Self::PlayerUnregistered { .. } => "player_unregistered",
            Self::WidgetStateChanged { .. } => "widget_state_changed",
            Self::RecoveryPlay { .. } => "recovery_play",
            Self::RecoveryBackoff { .. } => "recovery_backoff",
            Self::BufferingRecovery { .. } => "buffering_recovery",
            Self::WidgetError { .. } => "widget_error",
            Self::ErrorRetry { .. } => "error_retry",
            Self::Closed { .. } => "closed",
        }
    }
}
