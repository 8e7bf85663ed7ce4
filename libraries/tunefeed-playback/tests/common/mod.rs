//! Shared fakes for coordinator integration tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tunefeed_playback::{
    CoordinatorConfig, ManualClock, MemoryStorage, Result, SessionCoordinator, SessionEvent,
    SlotKey, VideoRef, WidgetFactory, WidgetHandle, WidgetOptions, WidgetState,
};

pub type CallLog = Rc<RefCell<Vec<String>>>;

pub const A: &str = "aaaaaaaaaaa";
pub const B: &str = "bbbbbbbbbbb";
pub const CONTAINER: &str = "minimized-player";

pub fn video(id: &str) -> VideoRef {
    VideoRef::new(id)
}

/// Scriptable widget that records every call
pub struct FakeWidget {
    name: String,
    log: CallLog,
    state: Cell<WidgetState>,
    time: Cell<f64>,
    /// play() is recorded but the widget does not start
    refuse_play: Cell<bool>,
    destroyed: Cell<bool>,
    time_reads: Cell<u32>,
    state_reads: Cell<u32>,
}

impl FakeWidget {
    pub fn new(name: impl Into<String>, log: &CallLog) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            log: log.clone(),
            state: Cell::new(WidgetState::Unstarted),
            time: Cell::new(0.0),
            refuse_play: Cell::new(false),
            destroyed: Cell::new(false),
            time_reads: Cell::new(0),
            state_reads: Cell::new(0),
        })
    }

    fn record(&self, call: &str) {
        self.log.borrow_mut().push(format!("{}:{}", self.name, call));
    }

    pub fn state(&self) -> WidgetState {
        self.state.get()
    }

    pub fn set_state(&self, state: WidgetState) {
        self.state.set(state);
    }

    pub fn time(&self) -> f64 {
        self.time.get()
    }

    pub fn set_time(&self, seconds: f64) {
        self.time.set(seconds);
    }

    pub fn refuse_play(&self, refuse: bool) {
        self.refuse_play.set(refuse);
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// (current_time reads, player_state reads)
    pub fn reads(&self) -> (u32, u32) {
        (self.time_reads.get(), self.state_reads.get())
    }

    pub fn as_handle(self: &Rc<Self>) -> Rc<dyn WidgetHandle> {
        self.clone()
    }
}

impl WidgetHandle for FakeWidget {
    fn play(&self) -> Result<()> {
        self.record("play");
        if !self.refuse_play.get() {
            self.state.set(WidgetState::Playing);
        }
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.record("pause");
        self.state.set(WidgetState::Paused);
        Ok(())
    }

    fn seek(&self, seconds: f64, _allow_seek_ahead: bool) -> Result<()> {
        self.record(&format!("seek:{seconds}"));
        self.time.set(seconds);
        Ok(())
    }

    fn current_time(&self) -> Result<f64> {
        self.time_reads.set(self.time_reads.get() + 1);
        Ok(self.time.get())
    }

    fn player_state(&self) -> Result<WidgetState> {
        self.state_reads.set(self.state_reads.get() + 1);
        Ok(self.state.get())
    }

    fn destroy(&self) -> Result<()> {
        self.record("destroy");
        self.destroyed.set(true);
        Ok(())
    }
}

/// Factory creating [`FakeWidget`]s named after their slot
pub struct FakeFactory {
    log: CallLog,
    created: Rc<RefCell<Vec<Rc<FakeWidget>>>>,
    options: Rc<RefCell<Vec<WidgetOptions>>>,
}

impl WidgetFactory for FakeFactory {
    fn api_loaded(&self) -> bool {
        true
    }

    fn create(
        &mut self,
        _container: &str,
        video_ref: &VideoRef,
        options: &WidgetOptions,
    ) -> Result<Rc<dyn WidgetHandle>> {
        let widget = FakeWidget::new(SlotKey::minimized(video_ref.clone()).to_string(), &self.log);
        self.created.borrow_mut().push(widget.clone());
        self.options.borrow_mut().push(options.clone());
        Ok(widget.as_handle())
    }
}

/// Coordinator wired to fakes, a manual clock and in-memory storage
pub struct Harness {
    pub coordinator: SessionCoordinator,
    pub clock: ManualClock,
    pub storage: MemoryStorage,
    pub log: CallLog,
    pub events: Vec<SessionEvent>,
    created: Rc<RefCell<Vec<Rc<FakeWidget>>>>,
    options: Rc<RefCell<Vec<WidgetOptions>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(CoordinatorConfig::default())
    }

    pub fn with_config(config: CoordinatorConfig) -> Self {
        Self::with_storage(config, MemoryStorage::new())
    }

    pub fn with_storage(config: CoordinatorConfig, storage: MemoryStorage) -> Self {
        let clock = ManualClock::new();
        let log = CallLog::default();
        let created = Rc::new(RefCell::new(Vec::new()));
        let options = Rc::new(RefCell::new(Vec::new()));
        let factory = FakeFactory {
            log: log.clone(),
            created: created.clone(),
            options: options.clone(),
        };
        let coordinator = SessionCoordinator::new(
            config,
            Box::new(storage.clone()),
            Box::new(factory),
            Box::new(clock.clone()),
        )
        .expect("valid config");

        Self {
            coordinator,
            clock,
            storage,
            log,
            events: Vec::new(),
            created,
            options,
        }
    }

    /// Mount an inline player for `id` and register it
    pub fn inline(&mut self, id: &str) -> Rc<FakeWidget> {
        let widget = FakeWidget::new(id, &self.log);
        self.coordinator
            .register_player(SlotKey::inline(video(id)), widget.as_handle());
        widget
    }

    /// Last floating widget the factory created
    pub fn floating(&self) -> Option<Rc<FakeWidget>> {
        self.created.borrow().last().cloned()
    }

    pub fn created_count(&self) -> usize {
        self.created.borrow().len()
    }

    pub fn last_options(&self) -> Option<WidgetOptions> {
        self.options.borrow().last().cloned()
    }

    /// Report the newest floating widget ready
    pub fn ready_floating(&mut self, id: &str) -> Rc<FakeWidget> {
        let widget = self.floating().expect("floating widget created");
        self.coordinator
            .on_widget_ready(&SlotKey::minimized(video(id)));
        widget
    }

    /// Advance time in 100 ms steps, polling after each step
    pub fn advance(&mut self, ms: u64) {
        let mut remaining = ms;
        while remaining > 0 {
            let step = remaining.min(100);
            self.clock.advance_ms(step);
            self.coordinator.poll();
            remaining -= step;
        }
        self.collect();
    }

    /// Move pending coordinator events into `events`
    pub fn collect(&mut self) {
        let drained = self.coordinator.drain_events();
        self.events.extend(drained);
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn position(&self, call: &str) -> Option<usize> {
        self.log.borrow().iter().position(|entry| entry == call)
    }

    pub fn count(&self, call: &str) -> usize {
        self.log.borrow().iter().filter(|entry| *entry == call).count()
    }
}
