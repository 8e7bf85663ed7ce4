//! Minimized widget host
//!
//! Owns the floating widget: when to create it, which video it shows and
//! when it must go. Registration and store updates happen in the
//! coordinator; the host only tracks its own instance.

use crate::clock::Timer;
use crate::error::{PlaybackError, Result};
use crate::types::{PlaybackState, SlotKey, WidgetState};
use crate::widget::{GuardedWidget, WidgetFactory, WidgetOptions};
use std::time::Duration;
use tracing::{debug, warn};
use tunefeed_core::VideoRef;

/// Lifecycle of the floating widget
#[derive(Debug, Default)]
pub struct MinimizedHost {
    container: Option<String>,
    widget: Option<GuardedWidget>,
    ready: bool,
    state_seen: bool,
    auto_resume: Timer,
    /// Video whose creation failed; not retried until the video changes
    failed_for: Option<VideoRef>,
}

impl MinimizedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// The floating container element is in the page
    pub fn mount_container(&mut self, container_id: impl Into<String>) {
        self.container = Some(container_id.into());
        self.failed_for = None;
    }

    /// The container left the page; returns the widget to tear down
    pub fn unmount_container(&mut self) -> Option<GuardedWidget> {
        self.container = None;
        self.take_widget()
    }

    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    pub fn widget(&self) -> Option<&GuardedWidget> {
        self.widget.as_ref()
    }

    /// Slot of the hosted widget
    pub fn slot(&self) -> Option<&SlotKey> {
        self.widget.as_ref().map(GuardedWidget::slot)
    }

    pub fn hosts(&self, slot: &SlotKey) -> bool {
        self.slot() == Some(slot)
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Whether the hosted widget no longer matches the state
    pub fn needs_teardown(&self, state: &PlaybackState) -> bool {
        match self.slot() {
            Some(slot) => !state.is_active_and_minimized() || !state.is_active(slot.video_ref()),
            None => false,
        }
    }

    /// Give up the hosted widget (for teardown)
    pub fn take_widget(&mut self) -> Option<GuardedWidget> {
        self.ready = false;
        self.state_seen = false;
        self.auto_resume.cancel();
        self.widget.take()
    }

    /// Whether every precondition for creating the widget holds
    pub fn should_create(&self, state: &PlaybackState, api_loaded: bool) -> bool {
        let Some(video_ref) = state.active_video_ref() else {
            return false;
        };
        self.widget.is_none()
            && self.container.is_some()
            && state.is_minimized
            && api_loaded
            && self.failed_for.as_ref() != Some(video_ref)
    }

    /// Create the floating widget for `video_ref`
    ///
    /// The widget reports ready asynchronously through the coordinator.
    pub fn create(
        &mut self,
        factory: &mut dyn WidgetFactory,
        video_ref: &VideoRef,
        options: &WidgetOptions,
    ) -> Result<SlotKey> {
        let container = self
            .container
            .clone()
            .ok_or_else(|| PlaybackError::WidgetNotReady("no minimized container".to_string()))?;

        debug!(
            "Creating minimized widget for {} at {}s",
            video_ref, options.start_seconds
        );
        match factory.create(&container, video_ref, options) {
            Ok(handle) => {
                let slot = SlotKey::minimized(video_ref.clone());
                self.widget = Some(GuardedWidget::new(slot.clone(), handle));
                self.ready = false;
                self.state_seen = false;
                self.failed_for = None;
                Ok(slot)
            }
            Err(e) => {
                warn!("Failed to create minimized widget for {}: {}", video_ref, e);
                self.failed_for = Some(video_ref.clone());
                Err(e)
            }
        }
    }

    /// The hosted widget reported ready
    pub fn mark_ready(&mut self, slot: &SlotKey) -> Option<GuardedWidget> {
        if !self.hosts(slot) {
            return None;
        }
        self.ready = true;
        self.widget.clone()
    }

    /// Track a state report from the hosted widget
    ///
    /// A pause or end while minimized schedules an automatic `play()` after
    /// `resume_after`, except for the very first report after creation.
    /// Returns whether a resume was scheduled.
    pub fn observe_state(
        &mut self,
        state: WidgetState,
        now: Duration,
        resume_after: Option<Duration>,
    ) -> bool {
        let first = !self.state_seen;
        self.state_seen = true;

        match (state, resume_after) {
            (WidgetState::Paused | WidgetState::Ended, Some(delay)) if !first => {
                debug!("Minimized widget paused itself, resuming in {:?}", delay);
                self.auto_resume.arm(now, delay);
                true
            }
            (WidgetState::Playing, _) => {
                self.auto_resume.cancel();
                false
            }
            _ => false,
        }
    }

    /// Fire the pending auto-resume; returns the widget to resume
    pub fn poll_auto_resume(&mut self, now: Duration) -> Option<&GuardedWidget> {
        if self.auto_resume.fire(now) {
            self.widget.as_ref()
        } else {
            None
        }
    }

    pub fn cancel_auto_resume(&mut self) {
        self.auto_resume.cancel();
    }
}
