//! Integration tests for the bundled scenarios
//!
//! Each scenario is replayed end to end; tests check the report, the widget
//! call log and what is left in session storage.

use std::path::PathBuf;
use tunefeed_playback::storage::STATE_KEY;
use tunefeed_playback::SessionEvent;
use tunefeed_sim::{Runner, Script, SimConfig, Step};

// ===== Test Helpers =====

fn scenario(name: &str) -> Script {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name);
    Script::load(&path).expect("scenario loads")
}

fn position(calls: &[String], call: &str) -> usize {
    calls
        .iter()
        .position(|entry| entry == call)
        .unwrap_or_else(|| panic!("{call} not in {calls:?}"))
}

// ===== Scenarios =====

#[test]
fn feed_to_detail_scenario_passes() {
    let mut runner = Runner::new(&SimConfig::default()).unwrap();
    let report = runner.run(&scenario("feed_to_detail.json")).unwrap();

    assert!(report.passed(), "{:?}", report.failed_expectations);
    assert!(report.final_state.active_video.is_none());
    assert!(!report.storage.contains_key(STATE_KEY));
    assert!(!report.storage.contains_key("videoTime_9bZkp7q19f0"));

    // The first video is remembered for a later switch back
    assert!(report.storage.contains_key("videoTime_dQw4w9WgXcQ"));

    // Outgoing floating widget paused before the new one was created
    let paused = position(&report.calls, "min-dQw4w9WgXcQ:pause");
    let destroyed = position(&report.calls, "min-dQw4w9WgXcQ:destroy");
    let next_played = position(&report.calls, "min-9bZkp7q19f0:play");
    assert!(paused < destroyed);
    assert!(destroyed < next_played);

    assert_eq!(report.events_named("widget_created").len(), 2);
    assert_eq!(report.events_named("closed").len(), 1);
}

#[test]
fn buffering_stall_recovers_once() {
    let mut runner = Runner::new(&SimConfig::default()).unwrap();
    let report = runner.run(&scenario("buffering_stall.json")).unwrap();

    assert!(report.passed(), "{:?}", report.failed_expectations);
    let recoveries = report.events_named("buffering_recovery");
    assert_eq!(recoveries.len(), 1);
    assert!(matches!(
        recoveries[0],
        SessionEvent::BufferingRecovery { current_time_seconds } if *current_time_seconds > 4.0
    ));
    assert!(report.events_named("recovery_play").is_empty());
}

#[test]
fn reload_picks_up_where_the_tab_left() {
    let config = SimConfig::default();
    let mut first = Runner::new(&config).unwrap();
    first
        .run(&Script {
            name: "before reload".to_string(),
            steps: vec![
                Step::Route {
                    path: "/".to_string(),
                },
                Step::Select {
                    video: "dQw4w9WgXcQ".to_string(),
                    post: "42".to_string(),
                },
                Step::Minimize,
                Step::Ready {
                    slot: "min-dQw4w9WgXcQ".to_string(),
                },
                Step::Wait { ms: 4_000 },
                Step::Route {
                    path: "/posts/42".to_string(),
                },
            ],
        })
        .unwrap();

    let storage = first.storage().clone();
    let mut reloaded = Runner::with_storage(&config, storage).unwrap();
    let state = reloaded.coordinator().state().clone();
    assert!(state.is_minimized);
    assert!(state.playback.current_time_seconds > 3.0);

    let report = reloaded
        .run(&Script {
            name: "after reload".to_string(),
            steps: vec![Step::Expect {
                active: Some("dQw4w9WgXcQ".to_string()),
                minimized: Some(true),
                playing: Some(true),
            }],
        })
        .unwrap();
    assert!(report.passed(), "{:?}", report.failed_expectations);
    assert_eq!(
        reloaded.coordinator().host().slot().map(ToString::to_string),
        Some("min-dQw4w9WgXcQ".to_string())
    );
}

#[test]
fn report_serializes_events_with_timestamps() {
    let mut runner = Runner::new(&SimConfig::default()).unwrap();
    let report = runner.run(&scenario("buffering_stall.json")).unwrap();

    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    let events = json["events"].as_array().unwrap();
    let recovery = events
        .iter()
        .find(|event| event["type"] == "buffering_recovery")
        .unwrap();
    assert_eq!(recovery["at_ms"], 15_100);
}
