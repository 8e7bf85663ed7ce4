//! WASM-compatible SessionCoordinator wrapper

use super::{BrowserSessionStorage, DateClock, JsWidgetFactory, JsWidgetHandle};
use crate::{ClickPath, CoordinatorConfig, PlaybackError, SessionCoordinator, SlotKey, WidgetState};
use js_sys::Function;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tunefeed_core::{PostRef, VideoRef};
use wasm_bindgen::prelude::*;

fn to_js(error: PlaybackError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_slot(slot: &str) -> Result<SlotKey, JsValue> {
    slot.parse().map_err(to_js)
}

/// WASM-compatible session coordinator
///
/// This wraps the core SessionCoordinator with a JavaScript-friendly API.
#[wasm_bindgen]
pub struct WasmSessionCoordinator {
    inner: SessionCoordinator,
    api_loaded: Rc<Cell<bool>>,

    // Event callback; events queue up for drainEvents() until one is set
    on_event: Option<Function>,
}

#[wasm_bindgen]
impl WasmSessionCoordinator {
    /// Create a coordinator
    ///
    /// `create_widget` is `(containerId, videoRef, options) => player`;
    /// `config` is an optional `CoordinatorConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(create_widget: Function, config: JsValue) -> Result<WasmSessionCoordinator, JsValue> {
        // Enable panic hooks for better error messages in console
        console_error_panic_hook::set_once();

        let config: CoordinatorConfig = if config.is_undefined() || config.is_null() {
            CoordinatorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&e.to_string()))?
        };

        let api_loaded = Rc::new(Cell::new(false));
        let storage = BrowserSessionStorage::new().map_err(to_js)?;
        let inner = SessionCoordinator::new(
            config,
            Box::new(storage),
            Box::new(JsWidgetFactory::new(create_widget, api_loaded.clone())),
            Box::new(DateClock::new()),
        )
        .map_err(to_js)?;

        Ok(Self {
            inner,
            api_loaded,
            on_event: None,
        })
    }

    // ===== Session Control =====

    #[wasm_bindgen(js_name = setActiveVideo)]
    pub fn set_active_video(&mut self, video_ref: String, post_ref: String) {
        self.inner
            .set_active_video(VideoRef::new(video_ref), PostRef::new(post_ref));
        self.flush();
    }

    pub fn minimize(&mut self) {
        self.inner.minimize();
        self.flush();
    }

    pub fn maximize(&mut self) {
        self.inner.maximize();
        self.flush();
    }

    pub fn close(&mut self) {
        self.inner.close();
        self.flush();
    }

    #[wasm_bindgen(js_name = markNavigating)]
    pub fn mark_navigating(&mut self, duration_ms: u32) {
        self.inner
            .mark_navigating(Duration::from_millis(u64::from(duration_ms)));
        self.flush();
    }

    #[wasm_bindgen(js_name = preventMinimize)]
    pub fn prevent_minimize(&mut self, duration_ms: u32) {
        self.inner
            .prevent_minimize(Duration::from_millis(u64::from(duration_ms)));
    }

    // ===== Inline Players =====

    /// Register an inline player object under `slot`
    #[wasm_bindgen(js_name = registerPlayer)]
    pub fn register_player(&mut self, slot: &str, player: JsValue) -> Result<(), JsValue> {
        let slot = parse_slot(slot)?;
        self.inner
            .register_player(slot, Rc::new(JsWidgetHandle::new(player)));
        self.flush();
        Ok(())
    }

    #[wasm_bindgen(js_name = unregisterPlayer)]
    pub fn unregister_player(&mut self, slot: &str) -> Result<(), JsValue> {
        let slot = parse_slot(slot)?;
        self.inner.unregister_player(&slot);
        self.flush();
        Ok(())
    }

    // ===== Navigation =====

    #[wasm_bindgen(js_name = onRouteChange)]
    pub fn on_route_change(&mut self, path: &str) {
        self.inner.on_route_change(path);
        self.flush();
    }

    #[wasm_bindgen(js_name = onHistoryNavigation)]
    pub fn on_history_navigation(&mut self) {
        self.inner.on_history_navigation();
        self.flush();
    }

    /// Handle a document click
    ///
    /// `roles` holds the `data-player-role` value (or null) of each element
    /// from the target up to the root.
    #[wasm_bindgen(js_name = onClick)]
    pub fn on_click(&mut self, roles: JsValue) -> Result<(), JsValue> {
        let roles: Vec<Option<String>> =
            serde_wasm_bindgen::from_value(roles).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let path = ClickPath::from_attributes(roles.iter().map(Option::as_deref));
        self.inner.on_click(&path);
        Ok(())
    }

    #[wasm_bindgen(js_name = playerClick)]
    pub fn player_click(&mut self) {
        self.inner.player_click();
    }

    #[wasm_bindgen(js_name = onVisibilityChange)]
    pub fn on_visibility_change(&mut self, visible: bool) {
        self.inner.on_visibility_change(visible);
        self.flush();
    }

    // ===== Minimized Widget =====

    #[wasm_bindgen(js_name = mountMinimizedContainer)]
    pub fn mount_minimized_container(&mut self, container_id: &str) {
        self.inner.mount_minimized_container(container_id);
        self.flush();
    }

    #[wasm_bindgen(js_name = unmountMinimizedContainer)]
    pub fn unmount_minimized_container(&mut self) {
        self.inner.unmount_minimized_container();
        self.flush();
    }

    /// The widget script called its ready hook
    #[wasm_bindgen(js_name = onApiLoaded)]
    pub fn on_api_loaded(&mut self) {
        self.api_loaded.set(true);
        self.inner.on_api_loaded();
        self.flush();
    }

    #[wasm_bindgen(js_name = onWidgetReady)]
    pub fn on_widget_ready(&mut self, slot: &str) -> Result<(), JsValue> {
        let slot = parse_slot(slot)?;
        self.inner.on_widget_ready(&slot);
        self.flush();
        Ok(())
    }

    /// Forward `onStateChange` with the widget's numeric state
    #[wasm_bindgen(js_name = onWidgetStateChange)]
    pub fn on_widget_state_change(&mut self, slot: &str, code: i32) -> Result<(), JsValue> {
        let slot = parse_slot(slot)?;
        match WidgetState::from_code(code) {
            Some(state) => self.inner.on_widget_state_change(&slot, state),
            None => tracing::debug!("Ignoring widget state {} from {}", code, slot),
        }
        self.flush();
        Ok(())
    }

    #[wasm_bindgen(js_name = onWidgetError)]
    pub fn on_widget_error(&mut self, slot: &str, code: i32) -> Result<(), JsValue> {
        let slot = parse_slot(slot)?;
        self.inner.on_widget_error(&slot, code);
        self.flush();
        Ok(())
    }

    /// Run due timers; call from a `setInterval`
    pub fn poll(&mut self) {
        self.inner.poll();
        self.flush();
    }

    // ===== State =====

    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.inner.state()).unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> JsValue {
        let events = self.inner.drain_events();
        serde_wasm_bindgen::to_value(&events).unwrap_or(JsValue::NULL)
    }

    // ===== Event Listeners =====

    /// Register an event callback, called once per event
    #[wasm_bindgen(js_name = onEvent)]
    pub fn on_event(&mut self, callback: Function) {
        self.on_event = Some(callback);
        self.flush();
    }

    fn flush(&mut self) {
        let Some(callback) = self.on_event.as_ref() else {
            return;
        };
        for event in self.inner.drain_events() {
            if let Ok(value) = serde_wasm_bindgen::to_value(&event) {
                callback.call1(&JsValue::NULL, &value).ok();
            }
        }
    }
}
