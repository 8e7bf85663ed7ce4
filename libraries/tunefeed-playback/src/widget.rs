//! Embeddable video widget contract
//!
//! The widget is a cross-origin black box. Platforms provide it through two
//! traits:
//! - [`WidgetFactory`] creates an instance in a container element
//! - [`WidgetHandle`] drives one instance
//!
//! Widget events (`onReady`, `onStateChange`, `onError`) are forwarded by the
//! platform to `SessionCoordinator::on_widget_*`.
//!
//! Every handle is wrapped in a [`GuardedWidget`] before the coordinator uses
//! it. The wrapper rejects calls on destroyed widgets and logs failures, so a
//! misbehaving widget can only ever leave playback in "state unknown".

use crate::error::{PlaybackError, Result};
use crate::types::{SlotKey, WidgetState};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};
use tunefeed_core::VideoRef;

/// One live widget instance
#[cfg_attr(test, mockall::automock)]
pub trait WidgetHandle {
    fn play(&self) -> Result<()>;

    fn pause(&self) -> Result<()>;

    /// Seek to `seconds`; `allow_seek_ahead` lets the widget fetch unbuffered data
    fn seek(&self, seconds: f64, allow_seek_ahead: bool) -> Result<()>;

    fn current_time(&self) -> Result<f64>;

    fn player_state(&self) -> Result<WidgetState>;

    fn destroy(&self) -> Result<()>;
}

/// Creates widget instances
pub trait WidgetFactory {
    /// Whether the widget script has finished loading
    fn api_loaded(&self) -> bool;

    /// Create a widget for `video_ref` inside the element `container`
    fn create(
        &mut self,
        container: &str,
        video_ref: &VideoRef,
        options: &WidgetOptions,
    ) -> Result<Rc<dyn WidgetHandle>>;
}

/// Player variables handed to the widget on creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetOptions {
    pub autoplay: bool,
    pub controls: bool,
    pub enable_js_api: bool,
    pub plays_inline: bool,
    /// Show related videos at the end
    pub show_related: bool,
    pub modest_branding: bool,
    pub show_annotations: bool,
    pub allow_fullscreen: bool,
    /// Whole seconds to start from
    pub start_seconds: u32,
    pub origin: String,
}

impl WidgetOptions {
    /// Options for the floating widget
    pub fn minimized(start_seconds: f64, autoplay: bool, origin: &str) -> Self {
        Self {
            autoplay,
            controls: true,
            enable_js_api: true,
            plays_inline: true,
            show_related: false,
            modest_branding: true,
            show_annotations: false,
            allow_fullscreen: false,
            start_seconds: whole_seconds(start_seconds),
            origin: origin.to_string(),
        }
    }
}

fn whole_seconds(seconds: f64) -> u32 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds.floor().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

/// Time and state read from a widget at one moment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub current_time: f64,
    pub state: WidgetState,
}

impl Snapshot {
    pub fn is_playing(&self) -> bool {
        self.state == WidgetState::Playing
    }
}

/// Liveness-checked, logging wrapper around a widget handle
///
/// Clones share liveness: once any clone is destroyed, every clone rejects
/// calls with [`PlaybackError::StaleHandle`].
#[derive(Clone)]
pub struct GuardedWidget {
    slot: SlotKey,
    inner: Rc<dyn WidgetHandle>,
    alive: Rc<Cell<bool>>,
}

impl fmt::Debug for GuardedWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedWidget")
            .field("slot", &self.slot)
            .field("alive", &self.alive.get())
            .finish()
    }
}

impl GuardedWidget {
    pub fn new(slot: SlotKey, inner: Rc<dyn WidgetHandle>) -> Self {
        Self {
            slot,
            inner,
            alive: Rc::new(Cell::new(true)),
        }
    }

    pub fn slot(&self) -> &SlotKey {
        &self.slot
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    /// Whether both wrappers drive the same underlying widget
    pub fn same_widget(&self, other: &GuardedWidget) -> bool {
        Rc::ptr_eq(&self.alive, &other.alive)
    }

    fn guard(&self) -> Result<&dyn WidgetHandle> {
        if self.alive.get() {
            Ok(self.inner.as_ref())
        } else {
            Err(PlaybackError::StaleHandle(self.slot.to_string()))
        }
    }

    fn logged<T>(&self, op: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            match e {
                PlaybackError::StaleHandle(_) => debug!("[{}] {} on destroyed widget", self.slot, op),
                _ => warn!("[{}] {} failed: {}", self.slot, op, e),
            }
        }
        result
    }

    pub fn play(&self) -> Result<()> {
        let result = self.guard().and_then(|w| w.play());
        self.logged("play", result)
    }

    pub fn pause(&self) -> Result<()> {
        let result = self.guard().and_then(|w| w.pause());
        self.logged("pause", result)
    }

    pub fn seek(&self, seconds: f64, allow_seek_ahead: bool) -> Result<()> {
        let result = self.guard().and_then(|w| w.seek(seconds, allow_seek_ahead));
        self.logged("seek", result)
    }

    pub fn current_time(&self) -> Result<f64> {
        let result = self.guard().and_then(|w| w.current_time());
        self.logged("current_time", result)
    }

    pub fn state(&self) -> Result<WidgetState> {
        let result = self.guard().and_then(|w| w.player_state());
        self.logged("player_state", result)
    }

    /// Read time and state together; `None` when either read fails
    pub fn snapshot(&self) -> Option<Snapshot> {
        let current_time = self.current_time().ok()?;
        let state = self.state().ok()?;
        Some(Snapshot {
            current_time,
            state,
        })
    }

    /// `play()` that only reports whether the call went through
    pub fn try_play(&self) -> bool {
        self.play().is_ok()
    }

    /// Destroy the widget
    ///
    /// Marks every clone stale first, so a failing destroy still leaves the
    /// handle unusable. Destroying twice is a no-op.
    pub fn destroy(&self) {
        if !self.alive.replace(false) {
            return;
        }
        if let Err(e) = self.inner.destroy() {
            warn!("[{}] destroy failed: {}", self.slot, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot() -> SlotKey {
        SlotKey::minimized(VideoRef::new("dQw4w9WgXcQ"))
    }

    #[test]
    fn destroyed_widget_rejects_calls() {
        let mut mock = MockWidgetHandle::new();
        mock.expect_destroy().times(1).returning(|| Ok(()));
        mock.expect_play().never();

        let widget = GuardedWidget::new(slot(), Rc::new(mock));
        let clone = widget.clone();

        widget.destroy();
        widget.destroy();

        assert!(!clone.is_alive());
        assert!(matches!(clone.play(), Err(PlaybackError::StaleHandle(_))));
    }

    #[test]
    fn snapshot_reads_time_and_state() {
        let mut mock = MockWidgetHandle::new();
        mock.expect_current_time().times(1).returning(|| Ok(31.5));
        mock.expect_player_state()
            .times(1)
            .returning(|| Ok(WidgetState::Playing));

        let widget = GuardedWidget::new(slot(), Rc::new(mock));
        let snapshot = widget.snapshot().unwrap();

        assert_eq!(snapshot.current_time, 31.5);
        assert!(snapshot.is_playing());
    }

    #[test]
    fn failing_call_is_reported_not_raised() {
        let mut mock = MockWidgetHandle::new();
        mock.expect_play()
            .returning(|| Err(PlaybackError::widget_call("playVideo", "not ready")));

        let widget = GuardedWidget::new(slot(), Rc::new(mock));
        assert!(!widget.try_play());
        assert!(widget.is_alive());
    }

    #[test]
    fn minimized_options_floor_start_time() {
        let options = WidgetOptions::minimized(42.9, true, "https://tunefeed.example");
        assert_eq!(options.start_seconds, 42);
        assert!(options.autoplay);
        assert!(!options.allow_fullscreen);

        assert_eq!(WidgetOptions::minimized(-1.0, true, "").start_seconds, 0);
        assert_eq!(WidgetOptions::minimized(f64::NAN, true, "").start_seconds, 0);
    }
}
