//! Mouse, wheel and keyboard handlers for `PixelGridView`.
//!
//! Handlers translate DOM events into controller calls on the shared state,
//! then forward the outcome: cursor style, render callback, `cellSelected`.
//! No `RefCell` borrow is held while a JavaScript callback runs.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, Element, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent,
};

use super::{Outcome, PixelGridView, SharedState};
use crate::layout::PanDirection;

type MouseClosures = Vec<(&'static str, Closure<dyn FnMut(MouseEvent)>)>;

/// Canvas-relative logical coordinates of a mouse event.
fn local_point(canvas: &HtmlCanvasElement, event: &MouseEvent) -> (f64, f64) {
    let rect = canvas.get_bounding_client_rect();
    (
        f64::from(event.client_x()) - rect.left(),
        f64::from(event.client_y()) - rect.top(),
    )
}

/// Keys typed into form fields are not navigation.
fn is_text_input(event: &KeyboardEvent) -> bool {
    event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok())
        .is_some_and(|element| {
            matches!(element.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT")
                || element.has_attribute("contenteditable")
        })
}

impl PixelGridView {
    pub(crate) fn install_listeners(
        canvas: &HtmlCanvasElement,
        state: &Rc<RefCell<SharedState>>,
    ) -> (
        MouseClosures,
        Closure<dyn FnMut(WheelEvent)>,
        Closure<dyn FnMut(KeyboardEvent)>,
    ) {
        let mut closures: MouseClosures = Vec::new();

        // Mouse down
        {
            let state = state.clone();
            let canvas_ref = canvas.clone();
            let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
                if event.button() != 0 {
                    return;
                }
                let (x, y) = local_point(&canvas_ref, &event);
                Self::internal_mouse_down(&state, x, y);
            }) as Box<dyn FnMut(MouseEvent)>);
            closures.push(("mousedown", closure));
        }

        // Mouse move (drag pan + hover)
        {
            let state = state.clone();
            let canvas_ref = canvas.clone();
            let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
                let (x, y) = local_point(&canvas_ref, &event);
                Self::internal_mouse_move(&state, x, y);
            }) as Box<dyn FnMut(MouseEvent)>);
            closures.push(("mousemove", closure));
        }

        // Mouse up
        {
            let state = state.clone();
            let canvas_ref = canvas.clone();
            let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
                let (x, y) = local_point(&canvas_ref, &event);
                Self::internal_mouse_up(&state, x, y);
            }) as Box<dyn FnMut(MouseEvent)>);
            closures.push(("mouseup", closure));
        }

        // Mouse leave (end drag, clear hover)
        {
            let state = state.clone();
            let closure = Closure::wrap(Box::new(move |_event: MouseEvent| {
                Self::internal_mouse_leave(&state);
            }) as Box<dyn FnMut(MouseEvent)>);
            closures.push(("mouseleave", closure));
        }

        for (event, closure) in &closures {
            canvas
                .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
                .ok();
        }

        // Wheel zoom; non-passive so the page does not scroll underneath.
        let wheel_closure = {
            let state = state.clone();
            let canvas_ref = canvas.clone();
            let closure = Closure::wrap(Box::new(move |event: WheelEvent| {
                event.prevent_default();
                let (x, y) = local_point(&canvas_ref, &event);
                Self::internal_wheel(&state, event.delta_y(), x, y);
            }) as Box<dyn FnMut(WheelEvent)>);
            let options = AddEventListenerOptions::new();
            options.set_passive(false);
            canvas
                .add_event_listener_with_callback_and_add_event_listener_options(
                    "wheel",
                    closure.as_ref().unchecked_ref(),
                    &options,
                )
                .ok();
            closure
        };

        // Arrow keys pan, +/- zoom
        let key_closure = {
            let state = state.clone();
            let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
                if event.ctrl_key() || event.meta_key() || event.alt_key() || is_text_input(&event)
                {
                    return;
                }
                if Self::internal_key_down(&state, &event.key()) {
                    event.prevent_default();
                }
            }) as Box<dyn FnMut(KeyboardEvent)>);

            if let Some(document) = web_sys::window().and_then(|window| window.document()) {
                document
                    .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())
                    .ok();
            }
            closure
        };

        (closures, wheel_closure, key_closure)
    }

    pub(crate) fn internal_mouse_down(state: &Rc<RefCell<SharedState>>, x: f64, y: f64) {
        let outcome = {
            let s = &mut *state.borrow_mut();
            s.controller.pointer_down(x, y, &s.grid)
        };
        Self::apply_outcome(state, outcome);
    }

    pub(crate) fn internal_mouse_move(state: &Rc<RefCell<SharedState>>, x: f64, y: f64) {
        let outcome = {
            let s = &mut *state.borrow_mut();
            let sync_state = s.sync.state();
            s.controller.pointer_move(x, y, &s.grid, sync_state.cache())
        };
        Self::apply_outcome(state, outcome);
    }

    pub(crate) fn internal_mouse_up(state: &Rc<RefCell<SharedState>>, x: f64, y: f64) {
        let outcome = {
            let s = &mut *state.borrow_mut();
            s.controller.pointer_up(x, y, &s.grid)
        };
        Self::apply_outcome(state, outcome);
    }

    pub(crate) fn internal_mouse_leave(state: &Rc<RefCell<SharedState>>) {
        let outcome = state.borrow_mut().controller.pointer_leave();
        Self::apply_outcome(state, outcome);
    }

    pub(crate) fn internal_wheel(state: &Rc<RefCell<SharedState>>, delta_y: f64, x: f64, y: f64) {
        let outcome = {
            let s = &mut *state.borrow_mut();
            s.controller.wheel(delta_y, x, y, &s.grid)
        };
        Self::apply_outcome(state, outcome);
    }

    pub(crate) fn internal_key_down(state: &Rc<RefCell<SharedState>>, key: &str) -> bool {
        let outcome = {
            let s = &mut *state.borrow_mut();
            let direction = match key {
                "ArrowLeft" => Some(PanDirection::Left),
                "ArrowRight" => Some(PanDirection::Right),
                "ArrowUp" => Some(PanDirection::Up),
                "ArrowDown" => Some(PanDirection::Down),
                _ => None,
            };
            match (direction, key) {
                (Some(direction), _) => s.controller.pan_step(direction, &s.grid),
                (None, "+" | "=") => s.controller.zoom_in(&s.grid),
                (None, "-" | "_") => s.controller.zoom_out(&s.grid),
                _ => return false,
            }
        };
        Self::apply_outcome(state, outcome);
        true
    }

    /// Forward a controller outcome to the DOM and host callbacks.
    pub(crate) fn apply_outcome(state: &Rc<RefCell<SharedState>>, outcome: Outcome) {
        let (render_callback, selected_callback) = {
            let mut s = state.borrow_mut();
            if let Some(cursor) = outcome.cursor {
                if cursor != s.cursor {
                    let _ = s.canvas.style().set_property("cursor", cursor.as_css());
                    s.cursor = cursor;
                }
            }
            if outcome.needs_render {
                s.needs_render = true;
            }
            (
                outcome
                    .needs_render
                    .then(|| s.render_callback.clone())
                    .flatten(),
                outcome
                    .selected
                    .and_then(|cell| s.cell_selected_callback.clone().map(|cb| (cell, cb))),
            )
        };
        Self::invoke_render_callback(render_callback);
        if let Some((cell, callback)) = selected_callback {
            log::debug!("cell selected ({}, {})", cell.x, cell.y);
            let _ = callback.call2(
                &JsValue::NULL,
                &JsValue::from(cell.x),
                &JsValue::from(cell.y),
            );
        }
    }

    /// Sync listener: the cache, progress or phase changed.
    pub(crate) fn internal_sync_changed(state: &Rc<RefCell<SharedState>>) {
        let Ok(mut s) = state.try_borrow_mut() else {
            log::debug!("sync update while view is busy; redraw deferred");
            return;
        };
        s.needs_render = true;
        let progress = s.sync.progress();
        let render_callback = s.render_callback.clone();
        let progress_callback = s.progress_callback.clone();
        drop(s);

        Self::invoke_render_callback(render_callback);
        if let Some(callback) = progress_callback {
            let _ = callback.call1(&JsValue::NULL, &JsValue::from(progress));
        }
    }

    pub(crate) fn invoke_render_callback(callback: Option<Function>) {
        if let Some(callback) = callback {
            let _ = callback.call0(&JsValue::NULL);
        }
    }
}
