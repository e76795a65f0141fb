//! Main PixelGridView struct - the browser entry point.
//!
//! This module provides the WASM-exported `PixelGridView` that:
//! - Owns the Canvas 2D renderer and the interaction controller
//! - Runs the batch loader against a JavaScript ledger object
//! - Wires mouse, wheel and keyboard events on creation
//!
//! Hosts drive redraws through a render callback (typically scheduling
//! `requestAnimationFrame(() => view.render())`) and receive clicks through
//! the `cellSelected(x, y)` callback.

mod interaction;

#[cfg(target_arch = "wasm32")]
mod events;
#[cfg(target_arch = "wasm32")]
mod js_ledger;

pub use interaction::{Cursor, InteractionController, Outcome};
#[cfg(target_arch = "wasm32")]
pub use js_ledger::JsLedger;

#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use js_sys::{Function, Promise};
#[cfg(target_arch = "wasm32")]
use serde::Serialize;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
#[cfg(target_arch = "wasm32")]
use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent};

#[cfg(target_arch = "wasm32")]
use crate::error::PixelGridError;
#[cfg(target_arch = "wasm32")]
use crate::layout::{PanDirection, Viewport};
#[cfg(target_arch = "wasm32")]
use crate::render::{CanvasRenderer, RenderBackend, RenderParams};
#[cfg(target_arch = "wasm32")]
use crate::sync::{LoadPhase, SyncHandle};
#[cfg(target_arch = "wasm32")]
use crate::types::{CellCoord, CellRecord, GridConfig};

/// Shared state that can be accessed by event handlers (wasm32 only)
#[cfg(target_arch = "wasm32")]
pub(crate) struct SharedState {
    pub(crate) grid: GridConfig,
    pub(crate) controller: InteractionController,
    pub(crate) sync: SyncHandle<JsLedger>,
    pub(crate) canvas: HtmlCanvasElement,
    pub(crate) cursor: Cursor,
    pub(crate) dpr: f32,
    pub(crate) needs_render: bool,
    pub(crate) render_callback: Option<Function>,
    pub(crate) cell_selected_callback: Option<Function>,
    pub(crate) progress_callback: Option<Function>,
}

/// Record shape handed to JavaScript (tooltips, dialogs).
#[cfg(target_arch = "wasm32")]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordView<'a> {
    x: u16,
    y: u16,
    color: String,
    hex: String,
    message: &'a str,
    owner: Option<&'a str>,
    tx_ref: Option<&'a str>,
}

#[cfg(target_arch = "wasm32")]
impl<'a> From<&'a CellRecord> for RecordView<'a> {
    fn from(record: &'a CellRecord) -> Self {
        Self {
            x: record.x,
            y: record.y,
            color: record.color.to_css(),
            hex: record.color.to_hex(),
            message: &record.message,
            owner: record.owner.as_deref(),
            tx_ref: record.tx_ref.as_deref(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(target_arch = "wasm32")]
fn record_to_js(record: Option<&CellRecord>) -> Result<JsValue, JsValue> {
    match record {
        Some(record) => to_js(&RecordView::from(record)),
        None => Ok(JsValue::NULL),
    }
}

/// `null`/`undefined` clears; otherwise `{ x, y }`.
#[cfg(target_arch = "wasm32")]
fn cell_from_js(value: JsValue) -> Result<Option<CellCoord>, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(None);
    }
    serde_wasm_bindgen::from_value(value)
        .map(Some)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(target_arch = "wasm32")]
fn config_from_js(value: JsValue) -> Result<GridConfig, PixelGridError> {
    let config = if value.is_null() || value.is_undefined() {
        GridConfig::default()
    } else {
        serde_wasm_bindgen::from_value(value).map_err(|e| PixelGridError::Config(e.to_string()))?
    };
    config.validate()?;
    Ok(config)
}

#[cfg(target_arch = "wasm32")]
fn pan_direction(name: &str) -> Option<PanDirection> {
    match name {
        "left" => Some(PanDirection::Left),
        "right" => Some(PanDirection::Right),
        "up" => Some(PanDirection::Up),
        "down" => Some(PanDirection::Down),
        _ => None,
    }
}

/// The main viewer struct exported to JavaScript
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct PixelGridView {
    state: Rc<RefCell<SharedState>>,
    renderer: RefCell<CanvasRenderer>,
    closures: Vec<(&'static str, Closure<dyn FnMut(MouseEvent)>)>,
    wheel_closure: Closure<dyn FnMut(WheelEvent)>,
    key_closure: Closure<dyn FnMut(KeyboardEvent)>,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl PixelGridView {
    /// Create a viewer over `canvas`, reading records from `ledger`.
    ///
    /// `config` is a partial `GridConfig` object (camelCase keys) or
    /// `undefined` for the defaults. Event handlers are installed here;
    /// call `startSync()` to begin loading.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        ledger: JsValue,
        config: JsValue,
        dpr: f32,
    ) -> Result<PixelGridView, JsValue> {
        console_error_panic_hook::set_once();
        crate::logging::init_console(log::LevelFilter::Info);

        let grid = config_from_js(config)?;
        let ledger = JsLedger::new(ledger)?;
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };

        let physical_width = canvas.width();
        let physical_height = canvas.height();
        let mut renderer = CanvasRenderer::new(canvas.clone())?;
        renderer.resize(physical_width, physical_height, dpr);

        let viewport = Viewport::new(
            &grid,
            f64::from(physical_width) / f64::from(dpr),
            f64::from(physical_height) / f64::from(dpr),
        );
        let sync = SyncHandle::new(Rc::new(ledger), grid.clone());

        let state = Rc::new(RefCell::new(SharedState {
            grid,
            controller: InteractionController::new(viewport),
            sync: sync.clone(),
            canvas: canvas.clone(),
            cursor: Cursor::Default,
            dpr,
            needs_render: true,
            render_callback: None,
            cell_selected_callback: None,
            progress_callback: None,
        }));

        {
            let weak = Rc::downgrade(&state);
            sync.set_listener(move || {
                if let Some(state) = weak.upgrade() {
                    Self::internal_sync_changed(&state);
                }
            });
        }

        let (closures, wheel_closure, key_closure) = Self::install_listeners(&canvas, &state);
        log::info!(
            "pixel grid view ready: {}x{} cells, canvas {physical_width}x{physical_height} @{dpr}",
            state.borrow().grid.grid_width,
            state.borrow().grid.grid_height
        );

        Ok(PixelGridView {
            state,
            renderer: RefCell::new(renderer),
            closures,
            wheel_closure,
            key_closure,
        })
    }

    /// Draw the current cache, viewport, hover and selection.
    #[wasm_bindgen]
    pub fn render(&self) -> Result<(), JsValue> {
        let mut s = self.state.borrow_mut();
        s.needs_render = false;
        let s = &*s;
        let sync_state = s.sync.state();
        let params = RenderParams {
            cache: sync_state.cache(),
            viewport: s.controller.viewport(),
            grid: &s.grid,
            hovered: s.controller.hovered(),
            selected: s.controller.selected(),
        };
        self.renderer.borrow_mut().render(&params)?;
        Ok(())
    }

    /// Whether state changed since the last `render()`.
    #[wasm_bindgen(js_name = "needsRender")]
    pub fn needs_render(&self) -> bool {
        self.state.borrow().needs_render
    }

    /// Cell under a canvas-relative point as `{ x, y }`, or `null`.
    #[wasm_bindgen(js_name = "hitTest")]
    pub fn hit_test(&self, x: f64, y: f64) -> Result<JsValue, JsValue> {
        let s = self.state.borrow();
        match s.controller.viewport().hit_test(x, y, &s.grid) {
            Some(cell) => to_js(&cell),
            None => Ok(JsValue::NULL),
        }
    }

    /// Pan by a screen-space delta in logical pixels.
    #[wasm_bindgen]
    pub fn pan(&self, dx: f64, dy: f64) {
        self.update(|s| s.controller.pan(dx, dy, &s.grid));
    }

    /// Pan one step: `"left"`, `"right"`, `"up"` or `"down"`.
    #[wasm_bindgen(js_name = "panStep")]
    pub fn pan_step(&self, direction: &str) -> Result<(), JsValue> {
        let direction = pan_direction(direction)
            .ok_or_else(|| JsValue::from_str(&format!("unknown pan direction `{direction}`")))?;
        self.update(|s| s.controller.pan_step(direction, &s.grid));
        Ok(())
    }

    #[wasm_bindgen(js_name = "zoomAroundPoint")]
    pub fn zoom_around_point(&self, zoom: f64, x: f64, y: f64) {
        self.update(|s| s.controller.zoom_around_point(zoom, x, y, &s.grid));
    }

    #[wasm_bindgen(js_name = "zoomIn")]
    pub fn zoom_in(&self) {
        self.update(|s| s.controller.zoom_in(&s.grid));
    }

    #[wasm_bindgen(js_name = "zoomOut")]
    pub fn zoom_out(&self) {
        self.update(|s| s.controller.zoom_out(&s.grid));
    }

    /// Zoom around the canvas centre (slider).
    #[wasm_bindgen(js_name = "setZoom")]
    pub fn set_zoom(&self, zoom: f64) {
        self.update(|s| s.controller.set_zoom(zoom, &s.grid));
    }

    #[wasm_bindgen(js_name = "devicePixelRatio")]
    pub fn device_pixel_ratio(&self) -> f32 {
        self.state.borrow().dpr
    }

    #[wasm_bindgen]
    pub fn zoom(&self) -> f64 {
        self.state.borrow().controller.viewport().zoom
    }

    #[wasm_bindgen(js_name = "setHover")]
    pub fn set_hover(&self, cell: JsValue) -> Result<(), JsValue> {
        let cell = cell_from_js(cell)?;
        self.update(|s| s.controller.set_hover(cell));
        Ok(())
    }

    #[wasm_bindgen(js_name = "setSelection")]
    pub fn set_selection(&self, cell: JsValue) -> Result<(), JsValue> {
        let cell = cell_from_js(cell)?;
        self.update(|s| s.controller.set_selection(cell));
        Ok(())
    }

    /// Resize the canvas buffer (physical pixels) and re-clamp the pan.
    #[wasm_bindgen]
    pub fn resize(&self, width: u32, height: u32, dpr: f32) {
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        {
            let mut renderer = self.renderer.borrow_mut();
            renderer.resize(width, height, dpr);
            renderer.set_canvas_css_size(
                f64::from(width) / f64::from(dpr),
                f64::from(height) / f64::from(dpr),
            );
        }
        self.update(|s| {
            s.dpr = dpr;
            let mut outcome = s.controller.resize(
                f64::from(width) / f64::from(dpr),
                f64::from(height) / f64::from(dpr),
                &s.grid,
            );
            // The buffer was cleared by the resize.
            outcome.needs_render = true;
            outcome
        });
    }

    /// Start the initial load in the background. Later calls are no-ops.
    #[wasm_bindgen(js_name = "startSync")]
    pub fn start_sync(&self) {
        let sync = self.state.borrow().sync.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let phase = sync.load().await;
            log::debug!("sync task finished in {phase:?}");
        });
    }

    /// Re-read the cell at `(x, y)` after a confirmed write.
    ///
    /// Resolves to the refreshed record or `null`.
    #[wasm_bindgen]
    pub fn refresh(&self, x: u16, y: u16) -> Promise {
        let sync = self.state.borrow().sync.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            let record = sync.refresh(CellCoord::new(x, y)).await?;
            record_to_js(record.as_ref())
        })
    }

    /// Stop loading and ignore late results.
    #[wasm_bindgen(js_name = "cancelSync")]
    pub fn cancel_sync(&self) {
        let sync = self.state.borrow().sync.clone();
        sync.cancel();
    }

    #[wasm_bindgen]
    pub fn progress(&self) -> u8 {
        self.state.borrow().sync.progress()
    }

    #[wasm_bindgen(js_name = "isLoading")]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().sync.is_loading()
    }

    /// `"idle"`, `"loading"`, `"complete"`, `"failed"` or `"cancelled"`.
    #[wasm_bindgen(js_name = "loadPhase")]
    pub fn load_phase(&self) -> String {
        let phase = self.state.borrow().sync.phase();
        match phase {
            LoadPhase::Idle => "idle",
            LoadPhase::FetchingTotal | LoadPhase::LoadingBatch { .. } => "loading",
            LoadPhase::Complete => "complete",
            LoadPhase::Failed => "failed",
            LoadPhase::Cancelled => "cancelled",
        }
        .to_string()
    }

    /// Message of the error that stopped the load, if any.
    #[wasm_bindgen(js_name = "lastError")]
    pub fn last_error(&self) -> Option<String> {
        let s = self.state.borrow();
        let sync_state = s.sync.state();
        sync_state.last_error().map(ToString::to_string)
    }

    #[wasm_bindgen(js_name = "cellCount")]
    pub fn cell_count(&self) -> usize {
        self.state.borrow().sync.state().cache().len()
    }

    #[wasm_bindgen(js_name = "isOccupied")]
    pub fn is_occupied(&self, x: u16, y: u16) -> bool {
        self.state
            .borrow()
            .sync
            .state()
            .cache()
            .is_occupied(CellCoord::new(x, y))
    }

    #[wasm_bindgen(js_name = "recordAt")]
    pub fn record_at(&self, x: u16, y: u16) -> Result<JsValue, JsValue> {
        let s = self.state.borrow();
        let sync_state = s.sync.state();
        record_to_js(sync_state.cache().get(CellCoord::new(x, y)))
    }

    /// Record under the pointer for tooltips, or `null`.
    #[wasm_bindgen(js_name = "hoveredRecord")]
    pub fn hovered_record(&self) -> Result<JsValue, JsValue> {
        let s = self.state.borrow();
        let sync_state = s.sync.state();
        let record = s
            .controller
            .hovered()
            .and_then(|cell| sync_state.cache().get(cell));
        record_to_js(record)
    }

    /// Called with no arguments whenever a redraw is needed.
    #[wasm_bindgen(js_name = "setRenderCallback")]
    pub fn set_render_callback(&self, callback: Option<Function>) {
        self.state.borrow_mut().render_callback = callback;
    }

    /// Called as `callback(x, y)` when a cell is clicked.
    #[wasm_bindgen(js_name = "setCellSelectedCallback")]
    pub fn set_cell_selected_callback(&self, callback: Option<Function>) {
        self.state.borrow_mut().cell_selected_callback = callback;
    }

    /// Called as `callback(progress)` after every load step.
    #[wasm_bindgen(js_name = "setProgressCallback")]
    pub fn set_progress_callback(&self, callback: Option<Function>) {
        self.state.borrow_mut().progress_callback = callback;
    }

    /// Cancel loading and detach all event listeners.
    #[wasm_bindgen]
    pub fn destroy(&self) {
        self.cancel_sync();
        let canvas = self.state.borrow().canvas.clone();
        for (event, closure) in &self.closures {
            let _ = canvas
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
        let _ = canvas.remove_event_listener_with_callback(
            "wheel",
            self.wheel_closure.as_ref().unchecked_ref(),
        );
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            let _ = document.remove_event_listener_with_callback(
                "keydown",
                self.key_closure.as_ref().unchecked_ref(),
            );
        }
        let mut s = self.state.borrow_mut();
        s.render_callback = None;
        s.cell_selected_callback = None;
        s.progress_callback = None;
    }
}

#[cfg(target_arch = "wasm32")]
impl PixelGridView {
    /// Apply a controller update and forward its outcome.
    fn update(&self, f: impl FnOnce(&mut SharedState) -> Outcome) {
        let outcome = {
            let mut s = self.state.borrow_mut();
            f(&mut s)
        };
        Self::apply_outcome(&self.state, outcome);
    }
}
