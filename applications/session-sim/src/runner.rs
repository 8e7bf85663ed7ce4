//! Script runner
//!
//! Owns a coordinator wired to simulated widgets, in-memory session storage
//! and a manual clock, and applies script steps to it one by one.

use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::script::{Script, Step};
use crate::widget::{SimFactory, WidgetBoard};
use serde::Serialize;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tunefeed_playback::{
    ClickPath, ManualClock, MemoryStorage, PlaybackState, PostRef, SessionCoordinator,
    SessionEvent, SlotKey, VideoRef,
};

/// An event and when it was drained
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: SessionEvent,
}

/// Outcome of one script run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub name: String,
    pub elapsed_ms: u64,
    pub events: Vec<TimedEvent>,
    pub calls: Vec<String>,
    pub final_state: PlaybackState,
    pub storage: BTreeMap<String, String>,
    pub failed_expectations: Vec<String>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.failed_expectations.is_empty()
    }

    /// Events with the given name, e.g. `"recovery_play"`
    pub fn events_named(&self, name: &str) -> Vec<&SessionEvent> {
        self.events
            .iter()
            .map(|timed| &timed.event)
            .filter(|event| event.name() == name)
            .collect()
    }
}

pub struct Runner {
    coordinator: SessionCoordinator,
    clock: ManualClock,
    storage: MemoryStorage,
    board: WidgetBoard,
    api_loaded: Rc<Cell<bool>>,
    tick: Duration,
    container_id: String,

    events: Vec<TimedEvent>,
    failures: Vec<String>,
}

impl Runner {
    /// Create a runner with fresh session storage
    pub fn new(config: &SimConfig) -> Result<Self> {
        Self::with_storage(config, MemoryStorage::new())
    }

    /// Create a runner on existing storage (a reload of the same tab)
    pub fn with_storage(config: &SimConfig, storage: MemoryStorage) -> Result<Self> {
        config.validate()?;

        let clock = ManualClock::new();
        let board = WidgetBoard::new();
        let api_loaded = Rc::new(Cell::new(config.sim.api_loaded));
        let coordinator = SessionCoordinator::new(
            config.coordinator.clone(),
            Box::new(storage.clone()),
            Box::new(SimFactory::new(board.clone(), api_loaded.clone())),
            Box::new(clock.clone()),
        )?;

        let mut runner = Self {
            coordinator,
            clock,
            storage,
            board,
            api_loaded,
            tick: Duration::from_millis(config.sim.tick_ms),
            container_id: config.sim.container_id.clone(),
            events: Vec::new(),
            failures: Vec::new(),
        };
        let container_id = runner.container_id.clone();
        runner.coordinator.mount_minimized_container(&container_id);
        runner.collect();
        Ok(runner)
    }

    pub fn coordinator(&self) -> &SessionCoordinator {
        &self.coordinator
    }

    pub fn board(&self) -> &WidgetBoard {
        &self.board
    }

    pub fn storage(&self) -> &MemoryStorage {
        &self.storage
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.coordinator.now().as_millis()).unwrap_or(u64::MAX)
    }

    /// Apply every step and report
    pub fn run(&mut self, script: &Script) -> Result<RunReport> {
        info!(
            "Running script '{}' ({} steps, {} ms simulated)",
            script.name,
            script.steps.len(),
            script.duration_ms()
        );
        for (index, step) in script.steps.iter().enumerate() {
            self.apply(index, step)?;
        }

        let report = RunReport {
            name: script.name.clone(),
            elapsed_ms: self.now_ms(),
            events: std::mem::take(&mut self.events),
            calls: self.board.calls(),
            final_state: self.coordinator.state().clone(),
            storage: self.storage.snapshot(),
            failed_expectations: std::mem::take(&mut self.failures),
        };
        if report.passed() {
            info!("Script '{}' passed", report.name);
        } else {
            warn!(
                "Script '{}' had {} failed expectations",
                report.name,
                report.failed_expectations.len()
            );
        }
        Ok(report)
    }

    /// Apply one step
    pub fn apply(&mut self, index: usize, step: &Step) -> Result<()> {
        debug!("Step {}: {}", index, step.action());
        match step {
            Step::Route { path } => self.coordinator.on_route_change(path),
            Step::History => self.coordinator.on_history_navigation(),
            Step::Click { roles } => {
                let path = ClickPath::from_attributes(roles.iter().map(Option::as_deref));
                let decision = self.coordinator.on_click(&path);
                debug!("Click decision: {:?}", decision);
            }
            Step::PlayerClick => self.coordinator.player_click(),
            Step::Select { video, post } => self
                .coordinator
                .set_active_video(VideoRef::new(video.as_str()), PostRef::new(post.as_str())),
            Step::Minimize => self.coordinator.minimize(),
            Step::Maximize => self.coordinator.maximize(),
            Step::Close => self.coordinator.close(),
            Step::MountInline { video } => {
                let slot = SlotKey::inline(VideoRef::new(video.as_str()));
                let widget = self.board.spawn(slot.clone());
                self.coordinator.register_player(slot, widget);
            }
            Step::UnmountInline { video } => {
                let slot = SlotKey::inline(VideoRef::new(video.as_str()));
                self.coordinator.unregister_player(&slot);
                self.board.remove(&slot);
            }
            Step::MountContainer { id } => {
                let id = id.clone().unwrap_or_else(|| self.container_id.clone());
                self.coordinator.mount_minimized_container(&id);
            }
            Step::UnmountContainer => self.coordinator.unmount_minimized_container(),
            Step::ApiLoaded => {
                self.api_loaded.set(true);
                self.coordinator.on_api_loaded();
            }
            Step::Ready { slot } => {
                let slot = self.widget_slot(index, slot)?;
                self.coordinator.on_widget_ready(&slot);
            }
            Step::WidgetState { slot, state, stuck } => {
                let slot = self.widget_slot(index, slot)?;
                if let Some(widget) = self.board.get(&slot) {
                    widget.set_state(*state, *stuck);
                }
                self.coordinator.on_widget_state_change(&slot, *state);
            }
            Step::WidgetTime { slot, seconds } => {
                let slot = self.widget_slot(index, slot)?;
                if let Some(widget) = self.board.get(&slot) {
                    widget.set_time(*seconds);
                }
            }
            Step::WidgetError { slot, code } => {
                let slot = self.widget_slot(index, slot)?;
                self.coordinator.on_widget_error(&slot, *code);
            }
            Step::Visibility { visible } => self.coordinator.on_visibility_change(*visible),
            Step::Wait { ms } => self.wait(Duration::from_millis(*ms)),
            Step::Expect {
                active,
                minimized,
                playing,
            } => self.expect(index, active.as_deref(), *minimized, *playing),
        }
        self.collect();
        Ok(())
    }

    /// Resolve a slot named by a step to a widget on the board
    fn widget_slot(&self, index: usize, slot: &str) -> Result<SlotKey> {
        let unknown = || SimError::UnknownWidget {
            step: index,
            slot: slot.to_string(),
        };
        let key: SlotKey = slot.parse().map_err(|_| unknown())?;
        if self.board.get(&key).is_none() {
            return Err(unknown());
        }
        Ok(key)
    }

    /// Let `duration` pass in ticks, polling after each
    fn wait(&mut self, duration: Duration) {
        let mut remaining = duration;
        while !remaining.is_zero() {
            let step = remaining.min(self.tick);
            self.clock.advance(step);
            self.board.advance(step);
            self.coordinator.poll();
            self.collect();
            remaining -= step;
        }
    }

    fn expect(
        &mut self,
        index: usize,
        active: Option<&str>,
        minimized: Option<bool>,
        playing: Option<bool>,
    ) {
        let state = self.coordinator.state();
        let mut failures = Vec::new();

        if let Some(expected) = active {
            let actual = state.active_video_ref().map(|video| video.as_str());
            let matches = if expected.is_empty() {
                actual.is_none()
            } else {
                actual == Some(expected)
            };
            if !matches {
                failures.push(format!(
                    "step {index}: expected active video {expected:?}, found {actual:?}"
                ));
            }
        }
        if let Some(expected) = minimized {
            if state.is_minimized != expected {
                failures.push(format!(
                    "step {index}: expected minimized={expected}, found {}",
                    state.is_minimized
                ));
            }
        }
        if let Some(expected) = playing {
            if state.playback.is_playing != expected {
                failures.push(format!(
                    "step {index}: expected playing={expected}, found {}",
                    state.playback.is_playing
                ));
            }
        }

        for failure in &failures {
            warn!("{}", failure);
        }
        self.failures.extend(failures);
    }

    fn collect(&mut self) {
        let at_ms = self.now_ms();
        self.events.extend(
            self.coordinator
                .drain_events()
                .into_iter()
                .map(|event| TimedEvent { at_ms, event }),
        );
    }
}
