//! End-to-end coordinator scenarios
//!
//! Drives the coordinator the way a page would: route changes, clicks,
//! widget callbacks and a polling interval on a manual clock.

mod common;

use common::{video, FakeWidget, Harness, A, B, CONTAINER};
use std::rc::Rc;
use tunefeed_playback::storage::{video_time_key, STATE_KEY};
use tunefeed_playback::{
    ClickDecision, ClickPath, CoordinatorConfig, PostRef, SessionEvent, SlotKey, WidgetHandle,
    WidgetState,
};

// ===== Test Helpers =====

fn navigational_click() -> ClickPath {
    ClickPath::from_attributes([None, Some("navigational"), None])
}

/// Container mounted, route observed, `id` playing inline
fn playing_inline(h: &mut Harness, id: &str) -> Rc<FakeWidget> {
    h.coordinator.mount_minimized_container(CONTAINER);
    h.coordinator.on_route_change("/");
    let inline = h.inline(id);
    h.coordinator.set_active_video(video(id), PostRef::new("1"));
    h.collect();
    inline
}

// ===== Scenarios =====

#[test]
fn feed_to_detail_and_back_to_closed() {
    let mut h = Harness::new();
    let a_inline = playing_inline(&mut h, A);
    assert_eq!(a_inline.state(), WidgetState::Playing);
    assert!(!h.coordinator.state().is_minimized);

    h.advance(5_000);
    a_inline.set_time(42.0);

    // Link to the post detail page
    assert_eq!(
        h.coordinator.on_click(&navigational_click()),
        ClickDecision::MinimizeScheduled
    );
    h.advance(100);
    h.coordinator.on_route_change("/posts/1");
    h.collect();

    let state = h.coordinator.state();
    assert!(state.is_minimized);
    assert!(state.playback.is_playing);
    assert_eq!(state.playback.current_time_seconds, 42.0);
    let options = h.last_options().unwrap();
    assert_eq!(options.start_seconds, 42);
    assert!(options.autoplay);

    let min_a = h.ready_floating(A);
    assert_eq!(min_a.state(), WidgetState::Playing);
    assert_eq!(min_a.time(), 42.0);
    assert_eq!(a_inline.state(), WidgetState::Paused);

    // The feed card unmounts with the old page
    h.coordinator.unregister_player(&SlotKey::inline(video(A)));
    assert!(h.coordinator.state().playback.is_playing);

    // A second video is clicked a second later
    h.advance(1_000);
    let b_inline = h.inline(B);
    h.coordinator
        .set_active_video(video(B), PostRef::new("2"));
    h.collect();

    let state = h.coordinator.state();
    assert_eq!(state.active_video_ref(), Some(&video(B)));
    assert!(state.is_minimized);
    assert!(min_a.is_destroyed());
    let paused = h.position("min-aaaaaaaaaaa:pause").unwrap();
    let destroyed = h.position("min-aaaaaaaaaaa:destroy").unwrap();
    assert!(paused < destroyed);
    assert_eq!(h.created_count(), 2);
    assert_eq!(h.last_options().unwrap().start_seconds, 0);

    let min_b = h.ready_floating(B);
    assert_eq!(min_b.state(), WidgetState::Playing);

    h.advance(2_000);
    h.coordinator.maximize();
    h.collect();
    assert!(!h.coordinator.state().is_minimized);
    assert!(min_b.is_destroyed());
    assert_eq!(b_inline.state(), WidgetState::Playing);

    h.coordinator.close();
    h.collect();
    let state = h.coordinator.state();
    assert!(state.active_video.is_none());
    assert!(!state.is_minimized);
    assert_eq!(b_inline.state(), WidgetState::Paused);
    assert!(!h.storage.contains_key(STATE_KEY));
    assert!(!h.storage.contains_key(&video_time_key(&video(B))));
    assert!(h
        .events
        .contains(&SessionEvent::Closed { video_ref: video(B) }));
}

#[test]
fn switching_back_resumes_where_left() {
    let mut h = Harness::new();
    h.coordinator.mount_minimized_container(CONTAINER);
    h.coordinator
        .set_active_video(video(A), PostRef::new("1"));
    h.coordinator.minimize();
    let min_a = h.ready_floating(A);
    min_a.set_time(73.5);

    h.advance(2_000);
    h.coordinator
        .set_active_video(video(B), PostRef::new("2"));
    h.ready_floating(B);

    h.advance(2_000);
    h.coordinator
        .set_active_video(video(A), PostRef::new("1"));
    assert_eq!(h.coordinator.state().playback.current_time_seconds, 73.5);
    assert_eq!(h.last_options().unwrap().start_seconds, 73);

    let min_a = h.ready_floating(A);
    assert_eq!(min_a.time(), 73.5);
}

#[test]
fn clicks_inside_player_never_minimize() {
    let mut h = Harness::new();
    playing_inline(&mut h, A);
    h.advance(2_000);

    let path = ClickPath::from_attributes([Some("player-control"), Some("navigational")]);
    assert!(matches!(
        h.coordinator.on_click(&path),
        ClickDecision::Ignored(_)
    ));
    h.advance(500);
    assert!(!h.coordinator.state().is_minimized);
}

#[test]
fn click_right_after_switch_is_suppressed() {
    let mut h = Harness::new();
    playing_inline(&mut h, A);

    assert_eq!(
        h.coordinator.on_click(&navigational_click()),
        ClickDecision::Suppressed
    );
    h.advance(500);
    assert!(!h.coordinator.state().is_minimized);
}

#[test]
fn repeated_clicks_minimize_once() {
    let mut h = Harness::new();
    playing_inline(&mut h, A);
    h.advance(2_000);

    for _ in 0..5 {
        h.coordinator.on_click(&navigational_click());
        h.clock.advance_ms(10);
    }
    h.advance(1_000);

    let minimized = h
        .events
        .iter()
        .filter(|event| matches!(event, SessionEvent::MinimizedChanged { minimized: true }))
        .count();
    assert_eq!(minimized, 1);
    assert_eq!(h.created_count(), 1);
}

#[test]
fn paused_video_stays_paused_when_minimized() {
    let mut h = Harness::new();
    let a_inline = playing_inline(&mut h, A);
    h.advance(2_000);

    a_inline.pause().unwrap();
    h.coordinator
        .on_widget_state_change(&SlotKey::inline(video(A)), WidgetState::Paused);
    assert!(!h.coordinator.state().playback.is_playing);

    h.coordinator.on_route_change("/posts/1");
    assert!(h.coordinator.state().is_minimized);
    assert!(!h.coordinator.state().playback.is_playing);
    assert!(!h.last_options().unwrap().autoplay);
}

#[test]
fn minimized_widget_pausing_itself_is_resumed() {
    let mut h = Harness::new();
    h.coordinator.mount_minimized_container(CONTAINER);
    h.coordinator
        .set_active_video(video(A), PostRef::new("1"));
    h.coordinator.minimize();
    let min_a = h.ready_floating(A);
    let slot = SlotKey::minimized(video(A));

    // First report after creation is ignored
    h.coordinator
        .on_widget_state_change(&slot, WidgetState::Playing);
    min_a.set_state(WidgetState::Paused);
    h.coordinator
        .on_widget_state_change(&slot, WidgetState::Paused);
    assert!(h.coordinator.state().playback.is_playing);

    let plays = h.count("min-aaaaaaaaaaa:play");
    h.clock.advance_ms(100);
    h.coordinator.poll();
    assert!(h.count("min-aaaaaaaaaaa:play") > plays);
    assert_eq!(min_a.state(), WidgetState::Playing);
}

#[test]
fn respected_pause_is_not_fought() {
    let config = CoordinatorConfig {
        respect_minimized_pause: true,
        ..CoordinatorConfig::default()
    };
    let mut h = Harness::with_config(config);
    h.coordinator.mount_minimized_container(CONTAINER);
    h.coordinator
        .set_active_video(video(A), PostRef::new("1"));
    h.coordinator.minimize();
    let min_a = h.ready_floating(A);
    let slot = SlotKey::minimized(video(A));

    h.coordinator
        .on_widget_state_change(&slot, WidgetState::Playing);
    min_a.set_state(WidgetState::Paused);
    h.coordinator
        .on_widget_state_change(&slot, WidgetState::Paused);
    assert!(!h.coordinator.state().playback.is_playing);

    let plays = h.count("min-aaaaaaaaaaa:play");
    h.advance(3_000);
    assert_eq!(h.count("min-aaaaaaaaaaa:play"), plays);
    assert_eq!(min_a.state(), WidgetState::Paused);
}

#[test]
fn reload_restores_minimized_session() {
    let mut h = Harness::new();
    h.coordinator.mount_minimized_container(CONTAINER);
    h.coordinator
        .set_active_video(video(A), PostRef::new("1"));
    h.coordinator.minimize();
    let min_a = h.ready_floating(A);
    min_a.set_time(12.0);
    h.coordinator
        .on_widget_state_change(&SlotKey::minimized(video(A)), WidgetState::Playing);

    // Same tab storage, fresh page
    let storage = h.storage.clone();
    let mut reloaded = Harness::with_storage(CoordinatorConfig::default(), storage);
    let state = reloaded.coordinator.state();
    assert_eq!(state.active_video_ref(), Some(&video(A)));
    assert!(state.is_minimized);
    assert!(!state.is_navigating);
    assert_eq!(state.playback.current_time_seconds, 12.0);

    reloaded
        .coordinator
        .mount_minimized_container(CONTAINER);
    assert_eq!(reloaded.created_count(), 1);
    assert_eq!(reloaded.last_options().unwrap().start_seconds, 12);
}

#[test]
fn unmounting_container_destroys_floating_widget() {
    let mut h = Harness::new();
    h.coordinator.mount_minimized_container(CONTAINER);
    h.coordinator
        .set_active_video(video(A), PostRef::new("1"));
    h.coordinator.minimize();
    let min_a = h.ready_floating(A);
    min_a.set_time(30.0);

    h.coordinator.unmount_minimized_container();
    assert!(min_a.is_destroyed());
    assert!(h.coordinator.registry().is_empty());
    assert_eq!(h.coordinator.state().playback.current_time_seconds, 30.0);
}

#[test]
fn closed_video_leaves_nothing_behind_when_its_card_unmounts() {
    let mut h = Harness::new();
    let a_inline = playing_inline(&mut h, A);
    a_inline.set_time(50.0);

    h.coordinator.close();
    assert!(h.storage.is_empty());

    // The feed card goes away after the session was closed
    h.coordinator.unregister_player(&SlotKey::inline(video(A)));
    h.collect();

    assert!(h.storage.is_empty());
    assert!(!h.storage.contains_key(&video_time_key(&video(A))));
    assert!(h.coordinator.store().history().get(&video(A)).is_none());

    // Reopening starts from the beginning
    h.inline(A);
    h.coordinator.set_active_video(video(A), PostRef::new("1"));
    assert_eq!(h.coordinator.state().playback.current_time_seconds, 0.0);
    assert!(!h.calls().iter().any(|call| call.contains("seek:50")));
}
