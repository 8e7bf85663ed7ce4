//! Scripted browsing sessions
//!
//! A script is a JSON document listing what the page and the widgets do, in
//! order:
//!
//! ```json
//! {
//!   "name": "feed to detail",
//!   "steps": [
//!     { "action": "route", "path": "/" },
//!     { "action": "mount_inline", "video": "dQw4w9WgXcQ" },
//!     { "action": "select", "video": "dQw4w9WgXcQ", "post": "42" },
//!     { "action": "wait", "ms": 2000 },
//!     { "action": "route", "path": "/posts/42" },
//!     { "action": "expect", "minimized": true, "playing": true }
//!   ]
//! }
//! ```

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tunefeed_playback::WidgetState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub name: String,
    pub steps: Vec<Step>,
}

/// One thing that happens on the simulated page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// The router reports a path
    Route { path: String },
    /// Browser back/forward
    History,
    /// A click; `roles` are `data-player-role` values from target to root
    Click {
        #[serde(default)]
        roles: Vec<Option<String>>,
    },
    /// A control of the floating player was clicked
    PlayerClick,
    /// A thumbnail was clicked
    Select { video: String, post: String },
    Minimize,
    Maximize,
    Close,
    /// An inline widget rendered and reported ready
    MountInline { video: String },
    UnmountInline { video: String },
    MountContainer {
        #[serde(default)]
        id: Option<String>,
    },
    UnmountContainer,
    /// The widget script finished loading
    ApiLoaded,
    /// A widget created by the coordinator reported ready
    Ready { slot: String },
    /// A widget changes state on its own and reports it
    ///
    /// A `stuck` widget ignores `play()` until its next state step.
    WidgetState {
        slot: String,
        state: WidgetState,
        #[serde(default)]
        stuck: bool,
    },
    /// The user scrubbed a widget without a state change
    WidgetTime { slot: String, seconds: f64 },
    WidgetError { slot: String, code: i32 },
    Visibility { visible: bool },
    /// Let time pass, polling every tick
    Wait { ms: u64 },
    /// Check the session state; mismatches are reported, not fatal
    Expect {
        #[serde(default)]
        active: Option<String>,
        #[serde(default)]
        minimized: Option<bool>,
        #[serde(default)]
        playing: Option<bool>,
    },
}

impl Step {
    /// Action name as written in scripts
    pub fn action(&self) -> &'static str {
        match self {
            Self::Route { .. } => "route",
            Self::History => "history",
            Self::Click { .. } => "click",
            Self::PlayerClick => "player_click",
            Self::Select { .. } => "select",
            Self::Minimize => "minimize",
            Self::Maximize => "maximize",
            Self::Close => "close",
            Self::MountInline { .. } => "mount_inline",
            Self::UnmountInline { .. } => "unmount_inline",
            Self::MountContainer { .. } => "mount_container",
            Self::UnmountContainer => "unmount_container",
            Self::ApiLoaded => "api_loaded",
            Self::Ready { .. } => "ready",
            Self::WidgetState { .. } => "widget_state",
            Self::WidgetTime { .. } => "widget_time",
            Self::WidgetError { .. } => "widget_error",
            Self::Visibility { .. } => "visibility",
            Self::Wait { .. } => "wait",
            Self::Expect { .. } => "expect",
        }
    }
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self> {
        let script: Self = serde_json::from_str(json)?;
        if script.steps.is_empty() {
            return Err(SimError::Script("script has no steps".to_string()));
        }
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Total simulated time the script waits
    pub fn duration_ms(&self) -> u64 {
        self.steps
            .iter()
            .map(|step| match step {
                Step::Wait { ms } => *ms,
                _ => 0,
            })
            .sum()
    }
}
