//! Recovery loop behavior against a floating widget that will not play
//!
//! Covers the back-off law, long buffering and widget errors, both through
//! the coordinator and against the loop directly.

mod common;

use common::{video, CallLog, FakeWidget, Harness, A, CONTAINER};
use proptest::prelude::*;
use std::rc::Rc;
use std::time::Duration;
use tunefeed_playback::recovery::{RecoveryAction, RecoveryLoop};
use tunefeed_playback::{CoordinatorConfig, GuardedWidget, PostRef, SessionEvent, SlotKey, WidgetState};

// ===== Test Helpers =====

/// Active video A shown in a ready floating widget
fn minimized_session(h: &mut Harness) -> Rc<FakeWidget> {
    h.coordinator.mount_minimized_container(CONTAINER);
    h.coordinator
        .set_active_video(video(A), PostRef::new("1"));
    h.coordinator.minimize();
    let widget = h.ready_floating(A);
    h.collect();
    widget
}

fn recovery_plays(events: &[SessionEvent]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::RecoveryPlay { attempt } => Some(*attempt),
            _ => None,
        })
        .collect()
}

fn backoffs(events: &[SessionEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, SessionEvent::RecoveryBackoff { .. }))
        .count()
}

/// Expected `play()` count after `ticks` stalled ticks with defaults
fn expected_plays(ticks: u32) -> u32 {
    (1..=ticks)
        .filter(|&tick| tick <= 10 || (tick - 10) % 5 == 0)
        .count() as u32
}

// ===== Back-off =====

#[test]
fn stalled_widget_backs_off_after_ten_attempts() {
    let mut h = Harness::new();
    let widget = minimized_session(&mut h);
    widget.refuse_play(true);
    widget.set_state(WidgetState::Paused);
    let before = h.count("min-aaaaaaaaaaa:play");

    // First tick 100 ms after ready, then every 300 ms: 20 ticks
    h.advance(100 + 19 * 300);

    let mut expected: Vec<u32> = (1..=10).collect();
    expected.extend([15, 20]);
    assert_eq!(recovery_plays(&h.events), expected);
    assert_eq!(backoffs(&h.events), 1);
    assert!(h
        .events
        .contains(&SessionEvent::RecoveryBackoff { attempts: 10 }));
    assert_eq!(h.count("min-aaaaaaaaaaa:play") - before, 12);
}

#[test]
fn playing_report_resets_the_count() {
    let mut h = Harness::new();
    let widget = minimized_session(&mut h);
    widget.refuse_play(true);
    widget.set_state(WidgetState::Paused);
    h.advance(100 + 11 * 300);
    assert_eq!(backoffs(&h.events), 1);

    widget.set_state(WidgetState::Playing);
    h.coordinator
        .on_widget_state_change(&SlotKey::minimized(video(A)), WidgetState::Playing);
    widget.set_state(WidgetState::Paused);
    h.events.clear();

    h.advance(3 * 300);
    assert_eq!(recovery_plays(&h.events), vec![1, 2, 3]);
    assert_eq!(backoffs(&h.events), 0);
}

#[test]
fn nothing_is_nudged_once_inline() {
    let mut h = Harness::new();
    let widget = minimized_session(&mut h);
    widget.refuse_play(true);
    widget.set_state(WidgetState::Paused);

    h.coordinator.maximize();
    h.advance(3_000);
    assert!(recovery_plays(&h.events).is_empty());
    assert!(!h.coordinator.recovery().is_running());
}

// ===== Buffering =====

#[test]
fn long_buffering_is_recovered_once() {
    let mut h = Harness::new();
    let widget = minimized_session(&mut h);
    widget.refuse_play(true);
    widget.set_state(WidgetState::Buffering);
    widget.set_time(61.0);
    h.coordinator
        .on_widget_state_change(&SlotKey::minimized(video(A)), WidgetState::Buffering);

    h.advance(12_000);

    let recoveries: Vec<_> = h
        .events
        .iter()
        .filter(|event| matches!(event, SessionEvent::BufferingRecovery { .. }))
        .collect();
    assert_eq!(
        recoveries,
        vec![&SessionEvent::BufferingRecovery {
            current_time_seconds: 61.0
        }]
    );
    assert!(recovery_plays(&h.events).is_empty());
    assert_eq!(h.count("min-aaaaaaaaaaa:seek:61"), 1);
}

#[test]
fn short_buffering_is_left_alone() {
    let mut h = Harness::new();
    let widget = minimized_session(&mut h);
    widget.set_state(WidgetState::Buffering);
    h.coordinator
        .on_widget_state_change(&SlotKey::minimized(video(A)), WidgetState::Buffering);

    h.advance(9_000);
    widget.set_state(WidgetState::Playing);
    h.advance(5_000);
    assert!(!h
        .events
        .iter()
        .any(|event| matches!(event, SessionEvent::BufferingRecovery { .. })));
}

// ===== Errors =====

#[test]
fn hard_error_stops_nudging() {
    let mut h = Harness::new();
    let widget = minimized_session(&mut h);
    widget.refuse_play(true);
    widget.set_state(WidgetState::Paused);

    h.coordinator
        .on_widget_error(&SlotKey::minimized(video(A)), 150);
    h.advance(5_000);

    assert!(recovery_plays(&h.events).is_empty());
    assert!(h.coordinator.recovery().is_halted());
    assert!(h.events.contains(&SessionEvent::WidgetError {
        slot: SlotKey::minimized(video(A)),
        code: 150,
        hard: true,
    }));
}

#[test]
fn soft_error_is_retried_after_three_seconds() {
    let mut h = Harness::new();
    let widget = minimized_session(&mut h);
    widget.set_state(WidgetState::Playing);

    h.coordinator
        .on_widget_error(&SlotKey::minimized(video(A)), 5);
    h.advance(2_900);
    assert!(!h.events.contains(&SessionEvent::ErrorRetry { code: 5 }));

    h.advance(100);
    assert!(h.events.contains(&SessionEvent::ErrorRetry { code: 5 }));
}

#[test]
fn new_video_clears_a_halt() {
    let mut h = Harness::new();
    minimized_session(&mut h);
    h.coordinator
        .on_widget_error(&SlotKey::minimized(video(A)), 101);
    assert!(h.coordinator.recovery().is_halted());

    h.advance(1_000);
    h.coordinator
        .set_active_video(video(common::B), PostRef::new("2"));
    assert!(!h.coordinator.recovery().is_halted());
}

// ===== Back-off law =====

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

proptest! {
    #[test]
    fn backoff_law_holds_for_any_tick_count(ticks in 1u32..80) {
        let log = CallLog::default();
        let fake = FakeWidget::new("min-a", &log);
        fake.refuse_play(true);
        fake.set_state(WidgetState::Paused);
        let widget = GuardedWidget::new(SlotKey::minimized(video("a")), fake.as_handle());

        let mut recovery = RecoveryLoop::new(&CoordinatorConfig::default());
        recovery.start(ms(0));
        let mut actions = Vec::new();
        for tick in 0..u64::from(ticks) {
            actions.extend(recovery.poll(ms(100 + tick * 300), true, Some(&widget)));
        }

        let plays = log.borrow().iter().filter(|call| *call == "min-a:play").count() as u32;
        prop_assert_eq!(plays, expected_plays(ticks));
        prop_assert_eq!(recovery.failures(), ticks);

        let backoff = actions
            .iter()
            .filter(|action| matches!(action, RecoveryAction::BackoffStarted { .. }))
            .count();
        prop_assert_eq!(backoff, usize::from(ticks > 10));
    }
}
