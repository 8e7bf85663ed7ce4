//! Navigation interception
//!
//! Turns route changes and document clicks into minimize decisions.
//!
//! Clicks are classified declaratively. Every element on the click path
//! (target first, then ancestors) may carry a `data-player-role` attribute:
//!
//! | value            | role                        |
//! |------------------|-----------------------------|
//! | `player-control` | [`ClickRole::PlayerControl`] |
//! | `navigational`   | [`ClickRole::Navigational`]  |
//! | `opaque`         | [`ClickRole::Opaque`]        |
//! | anything else    | [`ClickRole::Unmarked`]      |
//!
//! A player control anywhere on the path wins. Otherwise the nearest
//! navigational or opaque element decides. Unmarked paths never minimize.

use crate::clock::Timer;
use crate::types::PlaybackState;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Attribute carrying an element's [`ClickRole`]
pub const ROLE_ATTRIBUTE: &str = "data-player-role";

/// Declared role of one element on a click path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickRole {
    /// Part of a video player (controls, the widget itself)
    PlayerControl,
    /// Leads elsewhere in the app (links, post cards)
    Navigational,
    /// Stops classification: clicks inside never minimize
    Opaque,
    Unmarked,
}

impl ClickRole {
    /// Parse a `data-player-role` value
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("player-control") => Self::PlayerControl,
            Some("navigational") => Self::Navigational,
            Some("opaque") => Self::Opaque,
            _ => Self::Unmarked,
        }
    }
}

/// Roles along a click path, target first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickPath {
    roles: Vec<ClickRole>,
}

impl ClickPath {
    pub fn from_roles(roles: impl IntoIterator<Item = ClickRole>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
        }
    }

    /// Build a path from raw `data-player-role` values
    pub fn from_attributes<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        Self::from_roles(values.into_iter().map(ClickRole::from_attribute))
    }

    pub fn roles(&self) -> &[ClickRole] {
        &self.roles
    }

    pub fn classify(&self) -> ClickClass {
        classify(self)
    }
}

/// Outcome of classifying a click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickClass {
    /// Inside a player; never minimizes
    PlayerInternal,
    /// Leaves the current view; minimizes the inline video
    Navigational,
    Ignored,
}

impl fmt::Display for ClickClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PlayerInternal => "player-internal",
            Self::Navigational => "navigational",
            Self::Ignored => "ignored",
        };
        f.write_str(name)
    }
}

/// Classify a click path
pub fn classify(path: &ClickPath) -> ClickClass {
    if path.roles.contains(&ClickRole::PlayerControl) {
        return ClickClass::PlayerInternal;
    }
    path.roles
        .iter()
        .find_map(|role| match role {
            ClickRole::Navigational => Some(ClickClass::Navigational),
            ClickRole::Opaque => Some(ClickClass::Ignored),
            _ => None,
        })
        .unwrap_or(ClickClass::Ignored)
}

/// What happened to a route observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// First path seen; only recorded
    FirstObservation,
    Unchanged,
    Changed,
}

/// What happened to a click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickDecision {
    /// Nothing is playing inline
    NotApplicable,
    /// A suppression window is open
    Suppressed,
    /// Classified as not minimizing
    Ignored(ClickClass),
    /// A debounced minimize was (re)armed
    MinimizeScheduled,
}

/// Tracks route paths, click debouncing and suppression windows
#[derive(Debug, Clone, Default)]
pub struct NavigationInterceptor {
    last_path: Option<String>,
    pending_minimize: Timer,
    suppression: Timer,
}

impl NavigationInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current route path
    pub fn observe_route(&mut self, path: &str) -> RouteDecision {
        match self.last_path.replace(path.to_string()) {
            None => RouteDecision::FirstObservation,
            Some(previous) if previous == path => RouteDecision::Unchanged,
            Some(previous) => {
                debug!("Route changed: {} -> {}", previous, path);
                RouteDecision::Changed
            }
        }
    }

    pub fn last_path(&self) -> Option<&str> {
        self.last_path.as_deref()
    }

    /// Handle a document click
    ///
    /// Only an inline, active video can be minimized by a click.
    pub fn on_click(
        &mut self,
        path: &ClickPath,
        state: &PlaybackState,
        now: Duration,
        debounce: Duration,
    ) -> ClickDecision {
        if state.active_video.is_none() || state.is_minimized {
            return ClickDecision::NotApplicable;
        }
        if self.is_suppressed(now) {
            debug!("Click ignored: minimize suppressed");
            return ClickDecision::Suppressed;
        }

        match classify(path) {
            ClickClass::Navigational => {
                self.pending_minimize.arm(now, debounce);
                ClickDecision::MinimizeScheduled
            }
            class => ClickDecision::Ignored(class),
        }
    }

    /// Open a suppression window, replacing any open one
    pub fn suppress(&mut self, now: Duration, duration: Duration) {
        self.suppression.arm(now, duration);
    }

    pub fn is_suppressed(&self, now: Duration) -> bool {
        self.suppression.is_pending(now)
    }

    /// Fire the debounced minimize if due
    pub fn poll(&mut self, now: Duration) -> bool {
        self.pending_minimize.fire(now)
    }

    pub fn has_pending_minimize(&self) -> bool {
        self.pending_minimize.is_armed()
    }

    pub fn cancel_pending(&mut self) {
        self.pending_minimize.cancel();
    }

    /// Drop all timers; the route path is kept
    pub fn reset(&mut self) {
        self.pending_minimize.cancel();
        self.suppression.cancel();
    }
}
