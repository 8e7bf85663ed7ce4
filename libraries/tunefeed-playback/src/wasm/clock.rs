//! `Date.now()` clock

use crate::clock::Clock;
use std::time::Duration;

/// Milliseconds since construction, from `Date.now()`
#[derive(Debug, Clone)]
pub struct DateClock {
    origin_ms: f64,
}

impl DateClock {
    pub fn new() -> Self {
        Self {
            origin_ms: js_sys::Date::now(),
        }
    }
}

impl Default for DateClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for DateClock {
    fn now(&self) -> Duration {
        // Date.now() may step backwards on clock adjustments
        let elapsed_ms = (js_sys::Date::now() - self.origin_ms).max(0.0);
        Duration::from_secs_f64(elapsed_ms / 1000.0)
    }
}
