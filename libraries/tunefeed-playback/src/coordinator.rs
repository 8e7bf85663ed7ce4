//! Session coordinator - core orchestration
//!
//! Wires the store, registry, navigation interceptor, recovery loop and
//! minimized host together behind one injectable object. Platform code
//! forwards user actions and widget events here, calls [`SessionCoordinator::poll`]
//! from its own interval and drains [`SessionEvent`]s to update the UI.

use crate::{
    clock::Clock,
    config::CoordinatorConfig,
    error::Result,
    events::SessionEvent,
    host::MinimizedHost,
    navigation::{ClickDecision, ClickPath, NavigationInterceptor, RouteDecision},
    recovery::{is_hard_error, RecoveryAction, RecoveryLoop},
    registry::{is_displayed, PlayerRegistry},
    storage::SessionStorage,
    store::{CaptureTarget, PlaybackStore},
    types::{ActiveVideo, PlaybackPatch, PlaybackState, SlotKey, WidgetState},
    widget::{GuardedWidget, Snapshot, WidgetFactory, WidgetHandle, WidgetOptions},
};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tunefeed_core::{PostRef, VideoRef};

/// Keeps one video playing across navigation
pub struct SessionCoordinator {
    config: CoordinatorConfig,
    clock: Box<dyn Clock>,
    factory: Box<dyn WidgetFactory>,

    store: PlaybackStore,
    registry: PlayerRegistry,
    interceptor: NavigationInterceptor,
    recovery: RecoveryLoop,
    host: MinimizedHost,

    // Event queue for UI synchronization
    pending_events: Vec<SessionEvent>,
}

impl SessionCoordinator {
    /// Create a coordinator, restoring any session persisted in `storage`
    pub fn new(
        config: CoordinatorConfig,
        storage: Box<dyn SessionStorage>,
        factory: Box<dyn WidgetFactory>,
        clock: Box<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let store = PlaybackStore::new(storage, &config);
        let mut recovery = RecoveryLoop::new(&config);
        if store.state().is_active_and_minimized() {
            recovery.start(clock.now());
        }

        Ok(Self {
            recovery,
            store,
            registry: PlayerRegistry::new(),
            interceptor: NavigationInterceptor::new(),
            host: MinimizedHost::new(),
            pending_events: Vec::new(),
            clock,
            factory,
            config,
        })
    }

    // ===== Accessors =====

    pub fn state(&self) -> &PlaybackState {
        self.store.state()
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn store(&self) -> &PlaybackStore {
        &self.store
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn host(&self) -> &MinimizedHost {
        &self.host
    }

    pub fn recovery(&self) -> &RecoveryLoop {
        &self.recovery
    }

    /// Current time on the coordinator's clock
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Whether click-triggered minimization is currently suppressed
    pub fn is_minimize_suppressed(&self) -> bool {
        self.interceptor.is_suppressed(self.clock.now())
    }

    // ===== Session Control =====

    /// Make `video_ref` the active video
    ///
    /// Every other widget is paused before the new video is told to play.
    /// Starts minimized when another video was active, unless a navigation
    /// window is open.
    pub fn set_active_video(&mut self, video_ref: VideoRef, post_ref: PostRef) {
        let now = self.clock.now();
        if self.store.state().is_active(&video_ref) {
            debug!("Video {} already active", video_ref);
            return;
        }

        let previous = self.store.state().active_video_ref().cloned();
        let was_minimized = self.store.state().is_minimized;
        let outgoing = self
            .registry
            .resolve_active(self.store.state())
            .and_then(GuardedWidget::snapshot);

        let inline = SlotKey::inline(video_ref.clone());
        self.registry.pause_all_except(&inline);
        self.host.cancel_auto_resume();

        self.store
            .set_active_video(ActiveVideo::new(video_ref.clone(), post_ref), outgoing);
        self.interceptor.cancel_pending();
        self.interceptor.suppress(now, self.config.switch_suppression());
        self.recovery.reset();

        self.emit(SessionEvent::ActiveVideoChanged {
            video_ref,
            previous,
        });
        let minimized = self.store.state().is_minimized;
        if minimized != was_minimized {
            self.emit(SessionEvent::MinimizedChanged { minimized });
        }
        self.emit_playback();

        if minimized {
            self.recovery.start(now);
        } else {
            self.reconcile_inline(&inline);
        }
        self.sync_host();
    }

    /// Move the active video into the floating widget
    pub fn minimize(&mut self) {
        let now = self.clock.now();
        let state = self.store.state();
        if state.active_video.is_none() || state.is_minimized {
            return;
        }

        let snapshot = self
            .registry
            .resolve_active(state)
            .and_then(GuardedWidget::snapshot);
        self.interceptor.cancel_pending();
        self.interceptor.suppress(now, self.config.minimize_suppression());

        if self.store.minimize(snapshot) {
            self.emit(SessionEvent::MinimizedChanged { minimized: true });
            self.recovery.start(now);
        }
        self.emit_playback();
        self.sync_host();
    }

    /// Bring the active video back inline
    pub fn maximize(&mut self) {
        let now = self.clock.now();
        let Some(video_ref) = self.active_minimized_video() else {
            return;
        };

        let floating = SlotKey::minimized(video_ref.clone());
        if let Some(snapshot) = self.registry.get(&floating).and_then(GuardedWidget::snapshot) {
            self.store
                .update_playback(PlaybackPatch::time(snapshot.current_time));
        }
        self.registry.pause_all_except(&floating);

        self.store.maximize();
        self.interceptor.suppress(now, self.config.maximize_suppression());
        self.recovery.stop();
        self.emit(SessionEvent::MinimizedChanged { minimized: false });
        self.emit_playback();

        self.sync_host();
        self.reconcile_inline(&SlotKey::inline(video_ref));
    }

    /// End the session: destroy the floating widget and forget the video
    pub fn close(&mut self) {
        let Some(video_ref) = self.store.state().active_video_ref().cloned() else {
            return;
        };
        let was_minimized = self.store.state().is_minimized;

        if let Some(widget) = self.host.take_widget() {
            self.teardown(widget, false);
        }
        self.registry.pause_video(&video_ref);

        self.store.close();
        self.recovery.reset();
        self.interceptor.reset();

        if was_minimized {
            self.emit(SessionEvent::MinimizedChanged { minimized: false });
        }
        self.emit(SessionEvent::Closed { video_ref });
    }

    /// Open the navigating window for `duration`
    pub fn mark_navigating(&mut self, duration: Duration) {
        let now = self.clock.now();
        if self.store.mark_navigating(now, duration) {
            self.emit(SessionEvent::NavigatingChanged { navigating: true });
        }
    }

    /// Suppress click-triggered minimization for `duration`
    pub fn prevent_minimize(&mut self, duration: Duration) {
        let now = self.clock.now();
        self.interceptor.suppress(now, duration);
    }

    /// Merge a partial playback update (e.g. a volume change from the UI)
    pub fn update_playback(&mut self, patch: PlaybackPatch) {
        if self.store.update_playback(patch) {
            self.emit_playback();
        }
    }

    // ===== Player Registry =====

    /// Register an inline widget that reported ready
    pub fn register_player(&mut self, slot: SlotKey, handle: Rc<dyn WidgetHandle>) -> GuardedWidget {
        if is_displayed(&slot, self.store.state()) && self.store.restore_resume_point() {
            self.emit_playback();
        }
        let widget = self.registry.register(slot.clone(), handle, self.store.state());
        self.emit(SessionEvent::PlayerRegistered { slot });
        widget
    }

    /// Remove an inline widget that is unmounting
    ///
    /// Its final time and state are read once and filed with the store.
    pub fn unregister_player(&mut self, slot: &SlotKey) {
        if self.host.hosts(slot) {
            debug!("{} is owned by the minimized host", slot);
            return;
        }
        if !self.registry.contains(slot) {
            return;
        }

        let displayed = is_displayed(slot, self.store.state());
        if let Some(snapshot) = self.registry.unregister(slot) {
            self.file_capture(slot, displayed, snapshot);
        }
        self.emit(SessionEvent::PlayerUnregistered { slot: slot.clone() });
    }

    /// Pause every registered widget except `slot`
    pub fn pause_all_except(&self, slot: &SlotKey) -> usize {
        self.registry.pause_all_except(slot)
    }

    // ===== Navigation =====

    /// The router reported the current path
    pub fn on_route_change(&mut self, path: &str) {
        if self.interceptor.observe_route(path) == RouteDecision::Changed {
            self.handle_navigation();
        }
    }

    /// Browser history moved back or forward
    pub fn on_history_navigation(&mut self) {
        self.handle_navigation();
    }

    fn handle_navigation(&mut self) {
        let now = self.clock.now();
        if self.store.state().active_video.is_none() {
            return;
        }

        if self
            .store
            .mark_navigating(now, self.config.navigation_window())
        {
            self.emit(SessionEvent::NavigatingChanged { navigating: true });
        }

        if self.store.state().is_minimized {
            if let Some(snapshot) = self
                .registry
                .resolve_active(self.store.state())
                .and_then(GuardedWidget::snapshot)
            {
                if self
                    .store
                    .update_playback(PlaybackPatch::time(snapshot.current_time))
                {
                    self.emit_playback();
                }
            }
            self.interceptor
                .suppress(now, self.config.minimize_suppression());
        } else {
            self.minimize();
        }
    }

    /// A click landed somewhere in the document
    pub fn on_click(&mut self, path: &ClickPath) -> ClickDecision {
        let now = self.clock.now();
        let decision =
            self.interceptor
                .on_click(path, self.store.state(), now, self.config.click_debounce());
        debug!("Click: {:?}", decision);
        decision
    }

    /// A control of the floating player was clicked
    pub fn player_click(&mut self) {
        self.prevent_minimize(self.config.player_click_guard());
    }

    /// The tab's visibility changed
    pub fn on_visibility_change(&mut self, visible: bool) {
        if !visible {
            return;
        }
        let state = self.store.state();
        if !state.is_active_and_minimized() || !state.playback.is_playing || self.recovery.is_halted()
        {
            return;
        }
        if let Some(widget) = self.floating_widget() {
            if !matches!(widget.state(), Ok(WidgetState::Playing)) {
                info!("Tab visible again, resuming {}", widget.slot());
                widget.try_play();
            }
        }
    }

    // ===== Minimized Widget Host =====

    /// The floating container element was mounted
    pub fn mount_minimized_container(&mut self, container_id: &str) {
        self.host.mount_container(container_id);
        self.sync_host();
    }

    /// The floating container element was removed
    pub fn unmount_minimized_container(&mut self) {
        if let Some(widget) = self.host.unmount_container() {
            self.teardown(widget, true);
        }
    }

    /// The widget API finished loading
    pub fn on_api_loaded(&mut self) {
        self.sync_host();
    }

    /// The floating widget reported ready
    pub fn on_widget_ready(&mut self, slot: &SlotKey) {
        let now = self.clock.now();
        let Some(widget) = self.host.mark_ready(slot) else {
            debug!("Ready from unknown widget {}", slot);
            return;
        };

        let displayed = is_displayed(slot, self.store.state());
        if displayed && self.store.restore_resume_point() {
            self.emit_playback();
        }
        self.registry.register_guarded(widget, self.store.state());
        self.emit(SessionEvent::PlayerRegistered { slot: slot.clone() });
        self.registry.pause_all_except(slot);

        if displayed {
            self.recovery.start(now);
        }
    }

    /// A widget reported a state change
    pub fn on_widget_state_change(&mut self, slot: &SlotKey, state: WidgetState) {
        let now = self.clock.now();
        self.emit(SessionEvent::WidgetStateChanged {
            slot: slot.clone(),
            state,
        });

        let Some(widget) = self.registry.get(slot).cloned() else {
            return;
        };
        if !is_displayed(slot, self.store.state()) {
            return;
        }

        self.recovery.on_state(state, now);

        let current = self.store.state().playback.is_playing;
        let is_playing = if slot.is_minimized() {
            let respect = self.config.respect_minimized_pause;
            let resume_after = (!respect).then(|| self.config.auto_resume_delay());
            self.host.observe_state(state, now, resume_after);

            match state {
                WidgetState::Paused | WidgetState::Ended if !respect => true,
                _ => state.playing_intent(current),
            }
        } else {
            state.playing_intent(current)
        };

        let time = widget.current_time().ok();
        if self.store.record_report(time, is_playing) {
            self.emit_playback();
        }
    }

    /// A widget reported an error
    pub fn on_widget_error(&mut self, slot: &SlotKey, code: i32) {
        let now = self.clock.now();
        let hard = is_hard_error(code);
        self.emit(SessionEvent::WidgetError {
            slot: slot.clone(),
            code,
            hard,
        });

        if slot.is_minimized() && is_displayed(slot, self.store.state()) {
            self.recovery.on_error(code, now);
        } else {
            warn!("Widget {} reported error {}", slot, code);
        }
    }

    // ===== Polling =====

    /// Run every timer that is due
    pub fn poll(&mut self) {
        let now = self.clock.now();

        if self.store.expire_navigation(now) {
            self.emit(SessionEvent::NavigatingChanged { navigating: false });
        }

        if self.interceptor.poll(now) && !self.interceptor.is_suppressed(now) {
            debug!("Debounced navigational click, minimizing");
            self.minimize();
        }

        if let Some(widget) = self.host.poll_auto_resume(now).cloned() {
            let state = self.store.state();
            if state.is_active_and_minimized()
                && state.playback.is_playing
                && self.registry.contains(widget.slot())
            {
                widget.try_play();
            }
        }

        self.sync_host();

        let intended = self.store.state().playback.is_playing;
        let widget = self.floating_widget();
        for action in self.recovery.poll(now, intended, widget.as_ref()) {
            let event = match action {
                RecoveryAction::Play { attempt } => SessionEvent::RecoveryPlay { attempt },
                RecoveryAction::BackoffStarted { attempts } => {
                    SessionEvent::RecoveryBackoff { attempts }
                }
                RecoveryAction::BufferingRecovered {
                    current_time_seconds,
                } => SessionEvent::BufferingRecovery {
                    current_time_seconds,
                },
                RecoveryAction::ErrorRetry { code } => SessionEvent::ErrorRetry { code },
            };
            self.emit(event);
        }
    }

    // ===== Events =====

    /// Drain all pending events
    ///
    /// Returns every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    fn emit(&mut self, event: SessionEvent) {
        debug!("Event: {}", event.name());
        self.pending_events.push(event);
    }

    fn emit_playback(&mut self) {
        let playback = &self.store.state().playback;
        let event = SessionEvent::PlaybackUpdated {
            is_playing: playback.is_playing,
            current_time_seconds: playback.current_time_seconds,
        };
        self.emit(event);
    }

    // ===== Internals =====

    fn active_minimized_video(&self) -> Option<VideoRef> {
        let state = self.store.state();
        if state.is_minimized {
            state.active_video_ref().cloned()
        } else {
            None
        }
    }

    /// The registered floating widget of the active video
    fn floating_widget(&self) -> Option<GuardedWidget> {
        let video_ref = self.active_minimized_video()?;
        self.registry.get(&SlotKey::minimized(video_ref)).cloned()
    }

    fn reconcile_inline(&mut self, slot: &SlotKey) {
        if !self.registry.contains(slot) {
            return;
        }
        if self.store.restore_resume_point() {
            self.emit_playback();
        }
        self.registry.reconcile(slot, self.store.state());
    }

    /// Create or destroy the floating widget to match the state
    fn sync_host(&mut self) {
        if self.host.needs_teardown(self.store.state()) {
            if let Some(widget) = self.host.take_widget() {
                self.teardown(widget, true);
            }
        }

        if !self
            .host
            .should_create(self.store.state(), self.factory.api_loaded())
        {
            return;
        }
        if self.store.restore_resume_point() {
            self.emit_playback();
        }

        let state = self.store.state();
        let Some(video_ref) = state.active_video_ref().cloned() else {
            return;
        };
        let options = WidgetOptions::minimized(
            state.playback.current_time_seconds,
            state.playback.is_playing,
            &self.config.page_origin,
        );
        if let Ok(slot) = self
            .host
            .create(self.factory.as_mut(), &video_ref, &options)
        {
            self.emit(SessionEvent::WidgetCreated { slot });
        }
    }

    /// Unregister (capturing final state) and destroy a hosted widget
    fn teardown(&mut self, widget: GuardedWidget, keep_capture: bool) {
        let slot = widget.slot().clone();
        if self.registry.contains(&slot) {
            let displayed = is_displayed(&slot, self.store.state());
            let capture = self.registry.unregister(&slot);
            if keep_capture {
                if let Some(snapshot) = capture {
                    self.file_capture(&slot, displayed, snapshot);
                }
            }
            self.emit(SessionEvent::PlayerUnregistered { slot: slot.clone() });
        }

        widget.destroy();
        self.emit(SessionEvent::WidgetDestroyed { slot });
    }

    fn file_capture(&mut self, slot: &SlotKey, displayed: bool, snapshot: Snapshot) {
        let target = self
            .store
            .record_capture(slot.video_ref(), displayed, snapshot);
        if target == CaptureTarget::Playback {
            self.emit_playback();
        }
    }
}
