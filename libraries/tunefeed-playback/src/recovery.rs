//! Recovery loop
//!
//! Reconciles the floating widget's reported state with the intended one.
//! The widget pauses itself on its own (autoplay policies, losing focus,
//! ad breaks, buffering stalls); the loop nudges it back with a bounded
//! back-off.
//!
//! Back-off law, counting consecutive stalled ticks while playback is intended:
//! - ticks `1..=threshold` always call `play()`
//! - tick `threshold + 1` logs a single warning
//! - later ticks call `play()` only when `(tick - threshold) % every == 0`

use crate::clock::Timer;
use crate::config::CoordinatorConfig;
use crate::types::WidgetState;
use crate::widget::GuardedWidget;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Widget error codes that will not go away by retrying
///
/// 2: invalid parameter, 100: video not found, 101/150: embedding forbidden.
pub const HARD_ERROR_CODES: [i32; 4] = [2, 100, 101, 150];

/// Whether a widget error code is permanent for the current video
pub fn is_hard_error(code: i32) -> bool {
    HARD_ERROR_CODES.contains(&code)
}

/// Something the loop did on a poll
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecoveryAction {
    /// `play()` reissued on a stalled widget
    Play { attempt: u32 },
    /// The loop crossed its threshold and slowed down
    BackoffStarted { attempts: u32 },
    /// Long buffering: seeked in place (and played if intended)
    BufferingRecovered { current_time_seconds: f64 },
    /// `play()` reissued after a widget error
    ErrorRetry { code: i32 },
}

/// Periodic playback reconciliation for the floating widget
#[derive(Debug, Clone)]
pub struct RecoveryLoop {
    interval: Duration,
    kick_delay: Duration,
    threshold: u32,
    every: u32,
    buffering_timeout: Duration,
    error_retry_delay: Duration,

    running: bool,
    tick: Timer,
    failures: u32,
    buffering_since: Option<Duration>,
    error_retry: Timer,
    last_error: Option<i32>,
    halted: bool,
}

impl RecoveryLoop {
    pub fn new(config: &CoordinatorConfig) -> Self {
        Self {
            interval: config.recovery_interval(),
            kick_delay: config.minimize_kick_delay(),
            threshold: config.backoff_threshold,
            every: config.backoff_every.max(1),
            buffering_timeout: config.buffering_timeout(),
            error_retry_delay: config.error_retry_delay(),
            running: false,
            tick: Timer::new(),
            failures: 0,
            buffering_since: None,
            error_retry: Timer::new(),
            last_error: None,
            halted: false,
        }
    }

    /// Start ticking; the first tick comes after the kick delay
    pub fn start(&mut self, now: Duration) {
        if !self.running {
            debug!("Recovery loop started");
            self.running = true;
            self.failures = 0;
        }
        self.tick.arm(now, self.kick_delay);
    }

    /// Stop ticking; a halt from a hard error is kept
    pub fn stop(&mut self) {
        if self.running {
            debug!("Recovery loop stopped");
        }
        self.running = false;
        self.tick.cancel();
        self.error_retry.cancel();
        self.failures = 0;
        self.buffering_since = None;
    }

    /// Stop and forget everything (new video or session closed)
    pub fn reset(&mut self) {
        self.stop();
        self.halted = false;
        self.last_error = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Feed a state reported by the widget
    pub fn on_state(&mut self, state: WidgetState, now: Duration) {
        match state {
            WidgetState::Playing => {
                if self.halted {
                    info!("Widget playing again, resuming recovery");
                }
                self.failures = 0;
                self.halted = false;
                self.buffering_since = None;
            }
            WidgetState::Buffering => {
                self.buffering_since.get_or_insert(now);
            }
            _ => self.buffering_since = None,
        }
    }

    /// Feed a widget error; returns whether it was a hard error
    ///
    /// Soft errors schedule one `play()` retry. Hard errors halt play nudges
    /// until the widget reports playing or the video changes.
    pub fn on_error(&mut self, code: i32, now: Duration) -> bool {
        self.last_error = Some(code);
        if is_hard_error(code) {
            warn!("Widget error {} is permanent, halting recovery", code);
            self.halted = true;
            self.error_retry.cancel();
            true
        } else {
            debug!("Widget error {}, retrying in {:?}", code, self.error_retry_delay);
            self.error_retry.arm(now, self.error_retry_delay);
            false
        }
    }

    /// Run due work
    ///
    /// `widget` is the registered floating widget, if any. Widget calls go
    /// through the guarded adapter, so a destroyed widget makes this a no-op.
    pub fn poll(
        &mut self,
        now: Duration,
        intended: bool,
        widget: Option<&GuardedWidget>,
    ) -> Vec<RecoveryAction> {
        let mut actions = Vec::new();

        if self.error_retry.fire(now) && intended && !self.halted {
            if let Some(widget) = widget {
                if widget.try_play() {
                    actions.push(RecoveryAction::ErrorRetry {
                        code: self.last_error.unwrap_or_default(),
                    });
                }
            }
        }

        if !self.running || !self.tick.fire(now) {
            return actions;
        }
        self.tick.arm(now, self.interval);

        let Some(widget) = widget else {
            return actions;
        };
        let Ok(state) = widget.state() else {
            return actions;
        };

        match state {
            WidgetState::Playing => self.on_state(state, now),
            WidgetState::Buffering => self.check_buffering(now, intended, widget, &mut actions),
            stalled if stalled.is_stalled() => {
                self.buffering_since = None;
                if intended && !self.halted {
                    self.nudge(widget, &mut actions);
                }
            }
            _ => {}
        }
        actions
    }

    fn nudge(&mut self, widget: &GuardedWidget, actions: &mut Vec<RecoveryAction>) {
        self.failures += 1;
        let attempt = self.failures;

        if attempt <= self.threshold {
            debug!("Recovery attempt {} for {}", attempt, widget.slot());
            widget.try_play();
            actions.push(RecoveryAction::Play { attempt });
            return;
        }

        let beyond = attempt - self.threshold;
        if beyond == 1 {
            warn!(
                "Playback of {} failed {} times in a row, backing off",
                widget.slot(),
                self.threshold
            );
            actions.push(RecoveryAction::BackoffStarted {
                attempts: self.threshold,
            });
        }
        if beyond % self.every == 0 {
            widget.try_play();
            actions.push(RecoveryAction::Play { attempt });
        }
    }

    fn check_buffering(
        &mut self,
        now: Duration,
        intended: bool,
        widget: &GuardedWidget,
        actions: &mut Vec<RecoveryAction>,
    ) {
        let since = *self.buffering_since.get_or_insert(now);
        if now.saturating_sub(since) < self.buffering_timeout {
            return;
        }

        let Ok(time) = widget.current_time() else {
            return;
        };
        warn!(
            "{} buffering for {:?}, seeking in place at {:.2}s",
            widget.slot(),
            now.saturating_sub(since),
            time
        );
        if widget.seek(time, true).is_ok() && intended && !self.halted {
            widget.try_play();
        }
        self.buffering_since = Some(now);
        actions.push(RecoveryAction::BufferingRecovered {
            current_time_seconds: time,
        });
    }
}
