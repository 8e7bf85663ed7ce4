//! Player registry
//!
//! Maps slot keys to live widget handles so commands can fan out to every
//! rendered instance. Entries are owned by whichever component created the
//! widget; the registry never destroys anything itself.

use crate::types::{Placement, PlaybackState, SlotKey};
use crate::widget::{GuardedWidget, Snapshot, WidgetHandle};
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, warn};
use tunefeed_core::VideoRef;

/// Whether `slot` is the instance currently showing the active video
///
/// While minimized that is the floating widget; otherwise the inline one.
pub fn is_displayed(slot: &SlotKey, state: &PlaybackState) -> bool {
    state.is_active(slot.video_ref()) && slot.is_minimized() == state.is_minimized
}

/// What `reconcile` asked of a widget
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub seeked: bool,
    pub played: bool,
}

/// Registered widget instances, keyed by slot
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: BTreeMap<SlotKey, GuardedWidget>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly initialized widget
    ///
    /// If the slot shows the active video, the widget is immediately brought
    /// to the stored transport state.
    pub fn register(
        &mut self,
        slot: SlotKey,
        handle: Rc<dyn WidgetHandle>,
        state: &PlaybackState,
    ) -> GuardedWidget {
        self.register_guarded(GuardedWidget::new(slot, handle), state)
    }

    /// Register an already wrapped widget (shares liveness with the caller's copy)
    pub fn register_guarded(&mut self, widget: GuardedWidget, state: &PlaybackState) -> GuardedWidget {
        let slot = widget.slot().clone();
        debug!("Registering player instance for {}", slot);

        if let Some(previous) = self.players.insert(slot.clone(), widget.clone()) {
            if !previous.same_widget(&widget) {
                debug!("Replaced existing player instance for {}", slot);
            }
        }

        if is_displayed(&slot, state) {
            Self::reconcile_widget(&widget, state);
        }
        widget
    }

    /// Remove a widget, capturing its final time and state first
    ///
    /// Returns the capture when the widget was live and answered.
    pub fn unregister(&mut self, slot: &SlotKey) -> Option<Snapshot> {
        let widget = self.players.remove(slot)?;
        debug!("Unregistering player instance for {}", slot);

        if widget.is_alive() {
            widget.snapshot()
        } else {
            None
        }
    }

    /// Bring a registered widget to the stored transport state
    pub fn reconcile(&self, slot: &SlotKey, state: &PlaybackState) -> Option<ReconcileOutcome> {
        self.players
            .get(slot)
            .map(|widget| Self::reconcile_widget(widget, state))
    }

    /// Seek to the stored time and start playback if intended
    ///
    /// Failures (widget not ready yet) are only logged; the recovery loop
    /// picks them up.
    fn reconcile_widget(widget: &GuardedWidget, state: &PlaybackState) -> ReconcileOutcome {
        let playback = &state.playback;
        let mut outcome = ReconcileOutcome::default();

        if playback.current_time_seconds > 0.0 {
            debug!(
                "Restoring playback time for {}: {:.2}",
                widget.slot(),
                playback.current_time_seconds
            );
            outcome.seeked = widget.seek(playback.current_time_seconds, true).is_ok();
        }

        if playback.is_playing {
            outcome.played = widget.try_play();
        }
        outcome
    }

    /// Pause every widget except `keep`
    ///
    /// One failing widget never stops the others from pausing. Returns how
    /// many widgets accepted the pause.
    pub fn pause_all_except(&self, keep: &SlotKey) -> usize {
        let mut paused = 0;
        for (slot, widget) in &self.players {
            if slot == keep {
                continue;
            }
            match widget.pause() {
                Ok(()) => {
                    debug!("Paused video: {}", slot);
                    paused += 1;
                }
                Err(e) => warn!("Error pausing video {}: {}", slot, e),
            }
        }
        paused
    }

    /// Pause every widget showing `video_ref`
    pub fn pause_video(&self, video_ref: &VideoRef) -> usize {
        self.players
            .values()
            .filter(|widget| widget.slot().video_ref() == video_ref)
            .filter(|widget| widget.pause().is_ok())
            .count()
    }

    pub fn get(&self, slot: &SlotKey) -> Option<&GuardedWidget> {
        self.players.get(slot)
    }

    pub fn contains(&self, slot: &SlotKey) -> bool {
        self.players.contains_key(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SlotKey, &GuardedWidget)> {
        self.players.iter()
    }

    /// Call `f` for every registered widget
    pub fn for_each(&self, mut f: impl FnMut(&SlotKey, &GuardedWidget)) {
        for (slot, widget) in &self.players {
            f(slot, widget);
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Find a live widget for `video_ref`, trying `preferred` placement first
    pub fn resolve(&self, video_ref: &VideoRef, preferred: Placement) -> Option<&GuardedWidget> {
        let other = match preferred {
            Placement::Inline => Placement::Minimized,
            Placement::Minimized => Placement::Inline,
        };
        [preferred, other]
            .into_iter()
            .filter_map(|placement| {
                self.players
                    .get(&SlotKey::new(video_ref.clone(), placement))
            })
            .find(|widget| widget.is_alive())
    }

    /// The widget currently showing the active video
    ///
    /// The floating widget is preferred while minimized, the inline one otherwise.
    pub fn resolve_active(&self, state: &PlaybackState) -> Option<&GuardedWidget> {
        let video_ref = state.active_video_ref()?;
        let preferred = if state.is_minimized {
            Placement::Minimized
        } else {
            Placement::Inline
        };
        self.resolve(video_ref, preferred)
    }
}
