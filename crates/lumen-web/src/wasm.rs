#![forbid(unsafe_code)]

//! JavaScript bindings for [`RunnerCore`].

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

use crate::error::WebError;
use crate::runner_core::{RunnerCore, StepResult};

fn js_err(err: WebError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn step_object(result: &StepResult) -> Object {
    let obj = Object::new();
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("fired"),
        &JsValue::from_f64(result.fired as f64),
    );
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("patches"),
        &JsValue::from_f64(result.patches as f64),
    );
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("pendingTimers"),
        &JsValue::from_f64(result.pending_timers as f64),
    );
    let next = result
        .next_deadline_ms
        .map_or(JsValue::NULL, JsValue::from_f64);
    let _ = Reflect::set(&obj, &JsValue::from_str("nextDeadlineMs"), &next);
    obj
}

/// A landing page running in the browser.
///
/// The host serializes the page's layout once, then per frame reports time
/// and events, calls `step`, and applies `takePatches()`.
#[wasm_bindgen]
pub struct PageRunner {
    inner: RunnerCore,
}

#[wasm_bindgen]
impl PageRunner {
    #[wasm_bindgen(constructor)]
    pub fn new(snapshot_json: &str, config_json: Option<String>) -> Result<PageRunner, JsValue> {
        let inner =
            RunnerCore::from_snapshot_json(snapshot_json, config_json.as_deref()).map_err(js_err)?;
        Ok(Self { inner })
    }

    #[wasm_bindgen(js_name = domReady)]
    pub fn dom_ready(&mut self) {
        self.inner.dom_ready();
    }

    pub fn load(&mut self) {
        self.inner.load();
    }

    #[wasm_bindgen(js_name = setTime)]
    pub fn set_time(&mut self, ms: f64) -> Result<(), JsValue> {
        self.inner.set_time_ms(ms).map_err(js_err)
    }

    #[wasm_bindgen(js_name = advanceTime)]
    pub fn advance_time(&mut self, ms: f64) -> Result<(), JsValue> {
        self.inner.advance_time_ms(ms).map_err(js_err)
    }

    /// Dispatch a JSON event; returns whether the default action should be
    /// prevented.
    #[wasm_bindgen(js_name = pushEvent)]
    pub fn push_event(&mut self, json: &str) -> Result<bool, JsValue> {
        self.inner
            .push_encoded_event(json)
            .map(|outcome| outcome.prevented)
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = setBounds)]
    pub fn set_bounds(&mut self, element: u32, x: f64, y: f64, width: f64, height: f64) -> bool {
        self.inner.set_bounds(element, x, y, width, height)
    }

    pub fn step(&mut self) -> Object {
        step_object(&self.inner.step())
    }

    #[wasm_bindgen(js_name = takePatches)]
    pub fn take_patches(&mut self) -> Result<String, JsValue> {
        self.inner.take_patches_json().map_err(js_err)
    }

    #[wasm_bindgen(js_name = takeLogs)]
    pub fn take_logs(&mut self) -> Array {
        self.inner
            .take_logs()
            .into_iter()
            .map(|line| JsValue::from_str(&line))
            .collect()
    }

    pub fn dispose(&mut self) {
        self.inner.dispose();
    }

    #[wasm_bindgen(getter, js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }
}
