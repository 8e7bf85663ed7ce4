//! Tunefeed session simulator
//!
//! Replays a scripted browsing session (route changes, clicks, widget
//! callbacks, waits) against simulated widgets and a manual clock, and
//! reports every coordinator event together with the final state.
//!
//! This library exposes the runner for the binary and for tests.

pub mod config;
pub mod error;
pub mod runner;
pub mod script;
pub mod widget;

pub use config::{SimConfig, SimSettings};
pub use error::{Result, SimError};
pub use runner::{RunReport, Runner, TimedEvent};
pub use script::{Script, Step};
pub use widget::{SimFactory, SimWidget, WidgetBoard};
