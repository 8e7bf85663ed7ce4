//! Tunefeed - Persistent Video Session
//!
//! Platform-agnostic coordination of one externally hosted video across a
//! single-page application.
//!
//! This crate provides:
//! - Tab-scoped playback state with `sessionStorage` persistence
//! - A registry of every rendered widget instance
//! - Navigation interception (route changes, history, classified clicks)
//! - A floating "minimized" widget that survives navigation
//! - A recovery loop that keeps the floating widget playing
//!
//! # Architecture
//!
//! `tunefeed-playback` is completely platform-agnostic:
//! - No dependency on the DOM or the widget script
//! - No timers of its own: every delay is a deadline checked by `poll()`
//! - Works in the browser (feature `wasm`), in tests and in the simulator
//!
//! Platform-specific code (widgets, storage, time) is provided via traits.
//!
//! # Example: Minimize On Navigation
//!
//! ```rust
//! use std::rc::Rc;
//! use tunefeed_playback::{
//!     CoordinatorConfig, ManualClock, MemoryStorage, PlaybackError, PostRef, Result,
//!     SessionCoordinator, VideoRef, WidgetFactory, WidgetHandle, WidgetOptions,
//! };
//!
//! // Widget script not loaded yet
//! struct NoWidgets;
//!
//! impl WidgetFactory for NoWidgets {
//!     fn api_loaded(&self) -> bool {
//!         false
//!     }
//!
//!     fn create(
//!         &mut self,
//!         _container: &str,
//!         _video_ref: &VideoRef,
//!         _options: &WidgetOptions,
//!     ) -> Result<Rc<dyn WidgetHandle>> {
//!         Err(PlaybackError::WidgetApiUnavailable)
//!     }
//! }
//!
//! let mut coordinator = SessionCoordinator::new(
//!     CoordinatorConfig::default(),
//!     Box::new(MemoryStorage::new()),
//!     Box::new(NoWidgets),
//!     Box::new(ManualClock::new()),
//! )?;
//!
//! coordinator.on_route_change("/");
//! coordinator.set_active_video(VideoRef::new("dQw4w9WgXcQ"), PostRef::new("42"));
//! assert!(!coordinator.state().is_minimized);
//!
//! // Leaving the feed keeps the video alive in the floating widget
//! coordinator.on_route_change("/posts/42");
//! assert!(coordinator.state().is_minimized);
//! assert!(coordinator.state().playback.is_playing);
//! # Ok::<(), PlaybackError>(())
//! ```
//!
//! # Example: Click Classification
//!
//! ```rust
//! use tunefeed_playback::{ClickClass, ClickPath};
//!
//! // data-player-role values from the click target up to the document root
//! let path = ClickPath::from_attributes([None, Some("navigational"), None]);
//! assert_eq!(path.classify(), ClickClass::Navigational);
//!
//! let path = ClickPath::from_attributes([Some("player-control"), Some("navigational")]);
//! assert_eq!(path.classify(), ClickClass::PlayerInternal);
//! ```

pub mod clock;
pub mod config;
mod coordinator;
mod error;
pub mod events;
mod history;
pub mod host;
pub mod navigation;
pub mod recovery;
pub mod registry;
pub mod storage;
pub mod store;
pub mod types;
pub mod widget;

#[cfg(feature = "wasm")]
pub mod wasm;

// Public exports
pub use clock::{Clock, ManualClock, SystemClock, Timer};
pub use config::CoordinatorConfig;
pub use coordinator::SessionCoordinator;
pub use error::{PlaybackError, Result};
pub use events::SessionEvent;
pub use history::{HistoryEntry, VideoHistory};
pub use navigation::{ClickClass, ClickDecision, ClickPath, ClickRole, ROLE_ATTRIBUTE};
pub use storage::{MemoryStorage, SessionStorage};
pub use types::{
    ActiveVideo, Placement, Playback, PlaybackPatch, PlaybackState, SlotKey, WidgetState,
};
pub use widget::{GuardedWidget, Snapshot, WidgetFactory, WidgetHandle, WidgetOptions};

pub use tunefeed_core::{PostRef, VideoRef};
