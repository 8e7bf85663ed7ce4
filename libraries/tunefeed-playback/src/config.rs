//! Coordinator configuration
//!
//! All timings are milliseconds. Missing fields fall back to the defaults
//! below, so a partial TOML/JSON document is a valid configuration.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the session coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Interval between recovery loop ticks (default: 300)
    #[serde(default = "default_recovery_interval_ms")]
    pub recovery_interval_ms: u64,

    /// Consecutive failed ticks that always retry `play()` (default: 10)
    #[serde(default = "default_backoff_threshold")]
    pub backoff_threshold: u32,

    /// Past the threshold, retry only every Nth tick (default: 5)
    #[serde(default = "default_backoff_every")]
    pub backoff_every: u32,

    /// How long buffering may last before a recovery seek (default: 10000)
    #[serde(default = "default_buffering_timeout_ms")]
    pub buffering_timeout_ms: u64,

    /// Delay before retrying `play()` after a widget error (default: 3000)
    #[serde(default = "default_error_retry_delay_ms")]
    pub error_retry_delay_ms: u64,

    /// Delay of the first recovery tick after minimizing (default: 100)
    #[serde(default = "default_minimize_kick_delay_ms")]
    pub minimize_kick_delay_ms: u64,

    /// Delay before resuming a minimized widget that paused itself (default: 100)
    #[serde(default = "default_auto_resume_delay_ms")]
    pub auto_resume_delay_ms: u64,

    /// Length of the navigating window after a route change (default: 1000)
    #[serde(default = "default_navigation_window_ms")]
    pub navigation_window_ms: u64,

    /// Debounce between a navigational click and the minimize (default: 50)
    #[serde(default = "default_click_debounce_ms")]
    pub click_debounce_ms: u64,

    /// Minimize suppression after switching videos (default: 1000)
    #[serde(default = "default_switch_suppression_ms")]
    pub switch_suppression_ms: u64,

    /// Minimize suppression after minimizing or navigating (default: 1000)
    #[serde(default = "default_minimize_suppression_ms")]
    pub minimize_suppression_ms: u64,

    /// Minimize suppression after maximizing (default: 100)
    #[serde(default = "default_maximize_suppression_ms")]
    pub maximize_suppression_ms: u64,

    /// Minimize suppression after a click on the floating widget (default: 1000)
    #[serde(default = "default_player_click_guard_ms")]
    pub player_click_guard_ms: u64,

    /// Initial volume, 0-100 (default: 100)
    #[serde(default = "default_volume")]
    pub default_volume: u8,

    /// Treat a pause reported by the floating widget as user intent (default: false)
    ///
    /// When false, the floating widget keeps playing through pauses it
    /// reports on its own; closing it is the way to stop.
    #[serde(default)]
    pub respect_minimized_pause: bool,

    /// Page origin handed to the widget API (default: empty)
    #[serde(default)]
    pub page_origin: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            recovery_interval_ms: default_recovery_interval_ms(),
            backoff_threshold: default_backoff_threshold(),
            backoff_every: default_backoff_every(),
            buffering_timeout_ms: default_buffering_timeout_ms(),
            error_retry_delay_ms: default_error_retry_delay_ms(),
            minimize_kick_delay_ms: default_minimize_kick_delay_ms(),
            auto_resume_delay_ms: default_auto_resume_delay_ms(),
            navigation_window_ms: default_navigation_window_ms(),
            click_debounce_ms: default_click_debounce_ms(),
            switch_suppression_ms: default_switch_suppression_ms(),
            minimize_suppression_ms: default_minimize_suppression_ms(),
            maximize_suppression_ms: default_maximize_suppression_ms(),
            player_click_guard_ms: default_player_click_guard_ms(),
            default_volume: default_volume(),
            respect_minimized_pause: false,
            page_origin: String::new(),
        }
    }
}

impl CoordinatorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.recovery_interval_ms == 0 {
            return Err(PlaybackError::InvalidConfig(
                "recovery_interval_ms must be greater than zero".to_string(),
            ));
        }

        if self.backoff_every == 0 {
            return Err(PlaybackError::InvalidConfig(
                "backoff_every must be greater than zero".to_string(),
            ));
        }

        if self.buffering_timeout_ms == 0 {
            return Err(PlaybackError::InvalidConfig(
                "buffering_timeout_ms must be greater than zero".to_string(),
            ));
        }

        if self.default_volume > 100 {
            return Err(PlaybackError::InvalidConfig(format!(
                "default_volume must be 0-100, got {}",
                self.default_volume
            )));
        }

        Ok(())
    }

    pub fn recovery_interval(&self) -> Duration {
        Duration::from_millis(self.recovery_interval_ms)
    }

    pub fn buffering_timeout(&self) -> Duration {
        Duration::from_millis(self.buffering_timeout_ms)
    }

    pub fn error_retry_delay(&self) -> Duration {
        Duration::from_millis(self.error_retry_delay_ms)
    }

    pub fn minimize_kick_delay(&self) -> Duration {
        Duration::from_millis(self.minimize_kick_delay_ms)
    }

    pub fn auto_resume_delay(&self) -> Duration {
        Duration::from_millis(self.auto_resume_delay_ms)
    }

    pub fn navigation_window(&self) -> Duration {
        Duration::from_millis(self.navigation_window_ms)
    }

    pub fn click_debounce(&self) -> Duration {
        Duration::from_millis(self.click_debounce_ms)
    }

    pub fn switch_suppression(&self) -> Duration {
        Duration::from_millis(self.switch_suppression_ms)
    }

    pub fn minimize_suppression(&self) -> Duration {
        Duration::from_millis(self.minimize_suppression_ms)
    }

    pub fn maximize_suppression(&self) -> Duration {
        Duration::from_millis(self.maximize_suppression_ms)
    }

    pub fn player_click_guard(&self) -> Duration {
        Duration::from_millis(self.player_click_guard_ms)
    }
}

// Default values
fn default_recovery_interval_ms() -> u64 {
    300
}

fn default_backoff_threshold() -> u32 {
    10
}

fn default_backoff_every() -> u32 {
    5
}

fn default_buffering_timeout_ms() -> u64 {
    10_000
}

fn default_error_retry_delay_ms() -> u64 {
    3_000
}

fn default_minimize_kick_delay_ms() -> u64 {
    100
}

fn default_auto_resume_delay_ms() -> u64 {
    100
}

fn default_navigation_window_ms() -> u64 {
    1_000
}

fn default_click_debounce_ms() -> u64 {
    50
}

fn default_switch_suppression_ms() -> u64 {
    1_000
}

fn default_minimize_suppression_ms() -> u64 {
    1_000
}

fn default_maximize_suppression_ms() -> u64 {
    100
}

fn default_player_click_guard_ms() -> u64 {
    1_000
}

fn default_volume() -> u8 {
    100
}
