//! Simulated widgets
//!
//! A [`SimWidget`] behaves like a well-mannered embedded player: `play()`
//! starts it (unless it is stuck), time advances while it plays and every
//! call is recorded in a shared call log.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;
use tunefeed_playback::{
    Result, SlotKey, VideoRef, WidgetFactory, WidgetHandle, WidgetOptions, WidgetState,
};

/// Ordered record of widget calls, as `<slot>:<call>`
pub type CallLog = Rc<RefCell<Vec<String>>>;

pub struct SimWidget {
    slot: SlotKey,
    calls: CallLog,
    state: Cell<WidgetState>,
    time: Cell<f64>,
    stuck: Cell<bool>,
    destroyed: Cell<bool>,
}

impl SimWidget {
    pub fn new(slot: SlotKey, calls: CallLog) -> Self {
        Self {
            slot,
            calls,
            state: Cell::new(WidgetState::Unstarted),
            time: Cell::new(0.0),
            stuck: Cell::new(false),
            destroyed: Cell::new(false),
        }
    }

    fn record(&self, call: impl AsRef<str>) {
        self.calls
            .borrow_mut()
            .push(format!("{}:{}", self.slot, call.as_ref()));
    }

    pub fn slot(&self) -> &SlotKey {
        &self.slot
    }

    pub fn state(&self) -> WidgetState {
        self.state.get()
    }

    /// Change state on the widget's own initiative
    pub fn set_state(&self, state: WidgetState, stuck: bool) {
        self.state.set(state);
        self.stuck.set(stuck);
    }

    pub fn time(&self) -> f64 {
        self.time.get()
    }

    pub fn set_time(&self, seconds: f64) {
        self.time.set(seconds.max(0.0));
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Let `elapsed` pass; only a playing widget moves forward
    pub fn advance(&self, elapsed: Duration) {
        if self.state.get() == WidgetState::Playing && !self.destroyed.get() {
            self.time.set(self.time.get() + elapsed.as_secs_f64());
        }
    }
}

impl WidgetHandle for SimWidget {
    fn play(&self) -> Result<()> {
        self.record("play");
        if !self.stuck.get() {
            self.state.set(WidgetState::Playing);
        }
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.record("pause");
        if self.state.get() != WidgetState::Unstarted {
            self.state.set(WidgetState::Paused);
        }
        Ok(())
    }

    fn seek(&self, seconds: f64, _allow_seek_ahead: bool) -> Result<()> {
        self.record(format!("seek:{seconds:.1}"));
        self.set_time(seconds);
        Ok(())
    }

    fn current_time(&self) -> Result<f64> {
        Ok(self.time.get())
    }

    fn player_state(&self) -> Result<WidgetState> {
        Ok(self.state.get())
    }

    fn destroy(&self) -> Result<()> {
        self.record("destroy");
        self.destroyed.set(true);
        Ok(())
    }
}

/// Every widget on the simulated page, by slot
///
/// Destroyed and unmounted widgets are dropped from the board.
#[derive(Clone, Default)]
pub struct WidgetBoard {
    widgets: Rc<RefCell<BTreeMap<SlotKey, Rc<SimWidget>>>>,
    calls: CallLog,
}

impl WidgetBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a new widget for `slot`, replacing any previous one
    pub fn spawn(&self, slot: SlotKey) -> Rc<SimWidget> {
        let widget = Rc::new(SimWidget::new(slot.clone(), self.calls.clone()));
        self.widgets.borrow_mut().insert(slot, widget.clone());
        widget
    }

    pub fn get(&self, slot: &SlotKey) -> Option<Rc<SimWidget>> {
        self.widgets.borrow().get(slot).cloned()
    }

    pub fn remove(&self, slot: &SlotKey) -> Option<Rc<SimWidget>> {
        self.widgets.borrow_mut().remove(slot)
    }

    /// Advance every widget and forget destroyed ones
    pub fn advance(&self, elapsed: Duration) {
        let mut widgets = self.widgets.borrow_mut();
        widgets.retain(|_, widget| !widget.is_destroyed());
        for widget in widgets.values() {
            widget.advance(elapsed);
        }
    }

    /// Slots currently reporting playing
    pub fn playing(&self) -> Vec<SlotKey> {
        self.widgets
            .borrow()
            .iter()
            .filter(|(_, widget)| !widget.is_destroyed() && widget.state() == WidgetState::Playing)
            .map(|(slot, _)| slot.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

/// Creates floating widgets on the board
pub struct SimFactory {
    board: WidgetBoard,
    api_loaded: Rc<Cell<bool>>,
}

impl SimFactory {
    pub fn new(board: WidgetBoard, api_loaded: Rc<Cell<bool>>) -> Self {
        Self { board, api_loaded }
    }
}

impl WidgetFactory for SimFactory {
    fn api_loaded(&self) -> bool {
        self.api_loaded.get()
    }

    fn create(
        &mut self,
        container: &str,
        video_ref: &VideoRef,
        options: &WidgetOptions,
    ) -> Result<Rc<dyn WidgetHandle>> {
        let slot = SlotKey::minimized(video_ref.clone());
        debug!(
            "Simulating widget {} in #{} (start={}s, autoplay={})",
            slot, container, options.start_seconds, options.autoplay
        );
        let widget = self.board.spawn(slot);
        widget.set_time(f64::from(options.start_seconds));
        let handle: Rc<dyn WidgetHandle> = widget;
        Ok(handle)
    }
}
