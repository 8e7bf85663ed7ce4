//! Adapter for the embeddable widget's JS player object

use super::describe;
use crate::error::{PlaybackError, Result};
use crate::types::WidgetState;
use crate::widget::{WidgetFactory, WidgetHandle, WidgetOptions};
use js_sys::{Array, Function, Reflect};
use std::cell::Cell;
use std::rc::Rc;
use tunefeed_core::VideoRef;
use wasm_bindgen::{JsCast, JsValue};

/// One JS player object (`playVideo`, `pauseVideo`, `seekTo`, ...)
pub struct JsWidgetHandle {
    player: JsValue,
}

impl JsWidgetHandle {
    pub fn new(player: JsValue) -> Self {
        Self { player }
    }

    /// Call `method` on the player
    ///
    /// A missing method means the player has not finished initializing.
    fn call(&self, method: &str, args: &[JsValue]) -> Result<JsValue> {
        let function = Reflect::get(&self.player, &JsValue::from_str(method))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok())
            .ok_or_else(|| PlaybackError::WidgetNotReady(method.to_string()))?;

        let args: Array = args.iter().collect();
        function
            .apply(&self.player, &args)
            .map_err(|e| PlaybackError::widget_call(method, describe(&e)))
    }

    fn call_number(&self, method: &str) -> Result<f64> {
        self.call(method, &[])?
            .as_f64()
            .ok_or_else(|| PlaybackError::widget_call(method, "not a number"))
    }
}

impl WidgetHandle for JsWidgetHandle {
    fn play(&self) -> Result<()> {
        self.call("playVideo", &[]).map(|_| ())
    }

    fn pause(&self) -> Result<()> {
        self.call("pauseVideo", &[]).map(|_| ())
    }

    fn seek(&self, seconds: f64, allow_seek_ahead: bool) -> Result<()> {
        self.call(
            "seekTo",
            &[
                JsValue::from_f64(seconds),
                JsValue::from_bool(allow_seek_ahead),
            ],
        )
        .map(|_| ())
    }

    fn current_time(&self) -> Result<f64> {
        self.call_number("getCurrentTime")
    }

    fn player_state(&self) -> Result<WidgetState> {
        let code = self.call_number("getPlayerState")?;
        WidgetState::from_code(code as i32)
            .ok_or_else(|| PlaybackError::widget_call("getPlayerState", format!("unknown state {code}")))
    }

    fn destroy(&self) -> Result<()> {
        self.call("destroy", &[]).map(|_| ())
    }
}

/// Creates players through a JS callback
///
/// The callback is `(containerId, videoRef, options) => player`; it must wire
/// the player's `onReady`/`onStateChange`/`onError` back to the coordinator.
pub struct JsWidgetFactory {
    create: Function,
    api_loaded: Rc<Cell<bool>>,
}

impl JsWidgetFactory {
    pub fn new(create: Function, api_loaded: Rc<Cell<bool>>) -> Self {
        Self { create, api_loaded }
    }
}

impl WidgetFactory for JsWidgetFactory {
    fn api_loaded(&self) -> bool {
        self.api_loaded.get()
    }

    fn create(
        &mut self,
        container: &str,
        video_ref: &VideoRef,
        options: &WidgetOptions,
    ) -> Result<Rc<dyn WidgetHandle>> {
        let options = serde_wasm_bindgen::to_value(options)
            .map_err(|e| PlaybackError::widget_call("create", e.to_string()))?;
        let player = self
            .create
            .call3(
                &JsValue::NULL,
                &JsValue::from_str(container),
                &JsValue::from_str(video_ref.as_str()),
                &options,
            )
            .map_err(|e| PlaybackError::widget_call("create", describe(&e)))?;

        if player.is_null() || player.is_undefined() {
            return Err(PlaybackError::WidgetApiUnavailable);
        }
        Ok(Rc::new(JsWidgetHandle::new(player)))
    }
}
