//! WASM bindings for tunefeed-playback
//!
//! Binds the coordinator to the browser: the embeddable widget through a JS
//! factory callback, `window.sessionStorage` for persistence and `Date.now()`
//! as the clock.

pub mod clock;
pub mod coordinator;
pub mod storage;
pub mod widget;

pub use clock::DateClock;
pub use coordinator::WasmSessionCoordinator;
pub use storage::BrowserSessionStorage;
pub use widget::{JsWidgetFactory, JsWidgetHandle};

use wasm_bindgen::JsValue;

/// Best-effort text of a thrown JS value
pub(crate) fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
