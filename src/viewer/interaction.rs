//! Pointer interaction state machine.
//!
//! Owns the viewport, hover and selection, and turns pointer input into new
//! values of each. It never touches the DOM: the view forwards events here and
//! applies the returned [`Outcome`] (redraw, cursor, `cellSelected`).
//!
//! A press becomes a drag only after the pointer travels `drag_threshold`
//! screen pixels. Releasing an undragged press over the pressed cell selects
//! that cell.

use crate::layout::{PanDirection, Viewport};
use crate::sync::PixelCache;
use crate::types::{CellCoord, GridConfig};

/// Wheel zoom step per notch.
const ZOOM_IN_FACTOR: f64 = 1.1;
const ZOOM_OUT_FACTOR: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    /// Over a free cell that can be minted.
    Pointer,
    Grabbing,
}

impl Cursor {
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Pointer => "pointer",
            Self::Grabbing => "grabbing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum DragState {
    #[default]
    Idle,
    Dragging {
        /// Cell under the press, `None` when pressed outside the grid.
        anchor: Option<CellCoord>,
        press: (f64, f64),
        last: (f64, f64),
        /// Set once the pointer left the threshold radius.
        moved: bool,
    },
}

/// What the view should do after an input event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Outcome {
    pub needs_render: bool,
    pub cursor: Option<Cursor>,
    /// Emitted as `cellSelected(x, y)`.
    pub selected: Option<CellCoord>,
}

impl Outcome {
    fn redraw(needs_render: bool) -> Self {
        Self {
            needs_render,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    viewport: Viewport,
    drag: DragState,
    hovered: Option<CellCoord>,
    selected: Option<CellCoord>,
}

impl InteractionController {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            drag: DragState::Idle,
            hovered: None,
            selected: None,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn hovered(&self) -> Option<CellCoord> {
        self.hovered
    }

    pub fn selected(&self) -> Option<CellCoord> {
        self.selected
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    fn replace_viewport(&mut self, viewport: Viewport) -> bool {
        let changed = viewport != self.viewport;
        self.viewport = viewport;
        changed
    }

    /// Start a press. Hover is dropped until release so its highlight does
    /// not slide away from the pointer while panning.
    pub fn pointer_down(&mut self, x: f64, y: f64, grid: &GridConfig) -> Outcome {
        self.drag = DragState::Dragging {
            anchor: self.viewport.hit_test(x, y, grid),
            press: (x, y),
            last: (x, y),
            moved: false,
        };
        Outcome::redraw(self.hovered.take().is_some())
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, grid: &GridConfig, cache: &PixelCache) -> Outcome {
        match self.drag {
            DragState::Dragging {
                anchor,
                press,
                last,
                moved,
            } => {
                let moved = moved || distance(press, (x, y)) > grid.drag_threshold;
                self.drag = DragState::Dragging {
                    anchor,
                    press,
                    last: (x, y),
                    moved,
                };
                if !moved {
                    return Outcome::default();
                }
                let panned = self.viewport.panned_by_screen(x - last.0, y - last.1, grid);
                Outcome {
                    needs_render: self.replace_viewport(panned),
                    cursor: Some(Cursor::Grabbing),
                    selected: None,
                }
            }
            DragState::Idle => {
                let hovered = self.viewport.hit_test(x, y, grid);
                let cursor = match hovered {
                    Some(cell) if !cache.is_occupied(cell) => Cursor::Pointer,
                    _ => Cursor::Default,
                };
                let changed = hovered != self.hovered;
                self.hovered = hovered;
                Outcome {
                    needs_render: changed,
                    cursor: Some(cursor),
                    selected: None,
                }
            }
        }
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, grid: &GridConfig) -> Outcome {
        let DragState::Dragging { anchor, moved, .. } = std::mem::take(&mut self.drag) else {
            return Outcome::default();
        };
        if moved {
            return Outcome {
                needs_render: false,
                cursor: Some(Cursor::Default),
                selected: None,
            };
        }
        match (anchor, self.viewport.hit_test(x, y, grid)) {
            (Some(anchor), Some(released)) if anchor == released => {
                self.selected = Some(anchor);
                Outcome {
                    needs_render: true,
                    cursor: None,
                    selected: Some(anchor),
                }
            }
            _ => Outcome::default(),
        }
    }

    pub fn pointer_leave(&mut self) -> Outcome {
        self.drag = DragState::Idle;
        let had_hover = self.hovered.take().is_some();
        Outcome {
            needs_render: had_hover,
            cursor: Some(Cursor::Default),
            selected: None,
        }
    }

    /// Negative `delta_y` (wheel up) zooms in around the pointer.
    pub fn wheel(&mut self, delta_y: f64, x: f64, y: f64, grid: &GridConfig) -> Outcome {
        let factor = if delta_y < 0.0 {
            ZOOM_IN_FACTOR
        } else {
            ZOOM_OUT_FACTOR
        };
        self.zoom_around_point(self.viewport.zoom * factor, x, y, grid)
    }

    pub fn set_hover(&mut self, cell: Option<CellCoord>) -> Outcome {
        let changed = cell != self.hovered;
        self.hovered = cell;
        Outcome::redraw(changed)
    }

    pub fn set_selection(&mut self, cell: Option<CellCoord>) -> Outcome {
        let changed = cell != self.selected;
        self.selected = cell;
        Outcome::redraw(changed)
    }

    /// Pan by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64, grid: &GridConfig) -> Outcome {
        let panned = self.viewport.panned_by_screen(dx, dy, grid);
        Outcome::redraw(self.replace_viewport(panned))
    }

    pub fn pan_step(&mut self, direction: PanDirection, grid: &GridConfig) -> Outcome {
        let stepped = self.viewport.stepped(direction, grid);
        Outcome::redraw(self.replace_viewport(stepped))
    }

    pub fn zoom_around_point(&mut self, zoom: f64, x: f64, y: f64, grid: &GridConfig) -> Outcome {
        let zoomed = self.viewport.zoomed_around(zoom, x, y, grid);
        Outcome::redraw(self.replace_viewport(zoomed))
    }

    pub fn set_zoom(&mut self, zoom: f64, grid: &GridConfig) -> Outcome {
        let zoomed = self.viewport.zoomed_at_center(zoom, grid);
        Outcome::redraw(self.replace_viewport(zoomed))
    }

    pub fn zoom_in(&mut self, grid: &GridConfig) -> Outcome {
        self.set_zoom(self.viewport.zoom * ZOOM_IN_FACTOR, grid)
    }

    pub fn zoom_out(&mut self, grid: &GridConfig) -> Outcome {
        self.set_zoom(self.viewport.zoom * ZOOM_OUT_FACTOR, grid)
    }

    pub fn resize(&mut self, width: f64, height: f64, grid: &GridConfig) -> Outcome {
        let resized = self.viewport.resized(width, height, grid);
        Outcome::redraw(self.replace_viewport(resized))
    }
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (b.0 - a.0).hypot(b.1 - a.1)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::types::{CellRecord, Rgba};

    fn small_grid() -> GridConfig {
        GridConfig {
            grid_width: 10,
            grid_height: 10,
            initial_zoom: 2.0,
            ..GridConfig::default()
        }
    }

    fn controller(grid: &GridConfig) -> InteractionController {
        InteractionController::new(Viewport::new(grid, 100.0, 100.0))
    }

    #[test]
    fn hover_cursor_depends_on_occupancy() {
        let grid = small_grid();
        let mut ctl = controller(&grid);
        let mut cache = PixelCache::new();
        let center = ctl.viewport().grid_to_screen(5.5, 5.5, &grid);

        let free = ctl.pointer_move(center.0, center.1, &grid, &cache);
        assert_eq!(free.cursor, Some(Cursor::Pointer));
        assert!(free.needs_render);
        assert_eq!(ctl.hovered(), Some(CellCoord::new(5, 5)));

        cache.upsert(CellRecord::new(CellCoord::new(5, 5), Rgba::opaque(1, 2, 3), "", None));
        let taken = ctl.pointer_move(center.0, center.1, &grid, &cache);
        assert_eq!(taken.cursor, Some(Cursor::Default));
        assert!(!taken.needs_render);
    }

    #[test]
    fn hover_outside_grid_clears() {
        let grid = small_grid();
        let mut ctl = controller(&grid);
        let cache = PixelCache::new();
        ctl.set_hover(Some(CellCoord::new(1, 1)));
        // At 20px per cell the grid starts at -50px on screen.
        let out = ctl.pointer_move(-100.0, -100.0, &grid, &cache);
        assert!(out.needs_render);
        assert_eq!(ctl.hovered(), None);
    }

    #[test]
    fn small_jitter_still_selects() {
        let grid = small_grid();
        let mut ctl = controller(&grid);
        let cache = PixelCache::new();
        let (x, y) = ctl.viewport().grid_to_screen(2.5, 2.5, &grid);
        ctl.pointer_down(x, y, &grid);
        let jitter = ctl.pointer_move(x + 1.0, y, &grid, &cache);
        assert!(!jitter.needs_render);
        let up = ctl.pointer_up(x + 1.0, y, &grid);
        assert_eq!(up.selected, Some(CellCoord::new(2, 2)));
        assert_eq!(ctl.selected(), Some(CellCoord::new(2, 2)));
    }

    #[test]
    fn press_outside_grid_selects_nothing() {
        let grid = small_grid();
        let mut ctl = controller(&grid);
        ctl.pointer_down(-100.0, -100.0, &grid);
        assert_eq!(ctl.pointer_up(-100.0, -100.0, &grid).selected, None);
        assert!(!ctl.is_dragging());
    }

    #[test]
    fn leave_ends_drag_and_hover() {
        let grid = small_grid();
        let mut ctl = controller(&grid);
        ctl.set_hover(Some(CellCoord::new(0, 0)));
        let down = ctl.pointer_down(50.0, 50.0, &grid);
        assert!(down.needs_render);
        assert_eq!(ctl.hovered(), None);
        ctl.pointer_leave();
        assert!(!ctl.is_dragging());
        assert_eq!(ctl.hovered(), None);
        // A release after leaving is not a click.
        assert_eq!(ctl.pointer_up(50.0, 50.0, &grid).selected, None);
    }

    #[test]
    fn wheel_direction_picks_factor() {
        let grid = small_grid();
        let mut ctl = controller(&grid);
        ctl.wheel(-1.0, 50.0, 50.0, &grid);
        assert!((ctl.viewport().zoom - 2.2).abs() < 1e-9);
        ctl.wheel(1.0, 50.0, 50.0, &grid);
        assert!((ctl.viewport().zoom - 1.98).abs() < 1e-9);
    }

    #[test]
    fn zoom_buttons_respect_bounds() {
        let grid = small_grid();
        let mut ctl = controller(&grid);
        for _ in 0..100 {
            ctl.zoom_in(&grid);
        }
        assert_eq!(ctl.viewport().zoom, grid.max_zoom);
        let out = ctl.zoom_in(&grid);
        assert!(!out.needs_render);
        for _ in 0..100 {
            ctl.zoom_out(&grid);
        }
        assert_eq!(ctl.viewport().zoom, grid.min_zoom);
    }

    #[test]
    fn set_selection_reports_changes_only() {
        let grid = small_grid();
        let mut ctl = controller(&grid);
        assert!(ctl.set_selection(Some(CellCoord::new(1, 1))).needs_render);
        assert!(!ctl.set_selection(Some(CellCoord::new(1, 1))).needs_render);
        assert!(ctl.set_selection(None).needs_render);
    }
}
