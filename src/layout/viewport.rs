//! Viewport state and the screen ↔ grid coordinate transform.
//!
//! At zoom 1 the whole grid fits the canvas (`base_scale`). The grid is
//! centered, and pan is expressed in grid units so a drag feels the same at
//! every zoom level:
//!
//! ```text
//! screen_x = origin_x + (grid_x + pan_x) * effective_scale
//! ```
//!
//! All mutations return a new `Viewport`; nothing here touches shared state.

use crate::types::{CellCoord, GridConfig};

/// Direction for step panning (keyboard arrows / pan buttons).
///
/// The direction names the side of the grid that is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Zoom, pan and canvas size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Zoom factor relative to the fit-to-canvas scale
    pub zoom: f64,
    /// Horizontal pan in grid units
    pub pan_x: f64,
    /// Vertical pan in grid units
    pub pan_y: f64,
    /// Canvas width in logical pixels
    pub width: f64,
    /// Canvas height in logical pixels
    pub height: f64,
}

impl Viewport {
    /// Viewport at the configured initial zoom, centered.
    pub fn new(config: &GridConfig, width: f64, height: f64) -> Self {
        Self {
            zoom: config.clamp_zoom(config.initial_zoom),
            pan_x: 0.0,
            pan_y: 0.0,
            width,
            height,
        }
    }

    /// True when the canvas has no drawable area.
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    /// Scale (screen px per cell) that fits the whole grid at zoom 1.
    pub fn base_scale(&self, grid: &GridConfig) -> f64 {
        f64::min(
            self.width / grid.grid_width_f64(),
            self.height / grid.grid_height_f64(),
        )
    }

    pub fn effective_scale(&self, grid: &GridConfig) -> f64 {
        self.effective_scale_at(self.zoom, grid)
    }

    fn effective_scale_at(&self, zoom: f64, grid: &GridConfig) -> f64 {
        self.base_scale(grid) * zoom
    }

    /// Screen position of grid coordinate (0, 0) before pan is applied.
    pub fn origin(&self, grid: &GridConfig) -> (f64, f64) {
        self.origin_at(self.zoom, grid)
    }

    fn origin_at(&self, zoom: f64, grid: &GridConfig) -> (f64, f64) {
        let scale = self.effective_scale_at(zoom, grid);
        (
            (self.width - grid.grid_width_f64() * scale) / 2.0,
            (self.height - grid.grid_height_f64() * scale) / 2.0,
        )
    }

    /// Convert (fractional) grid coordinates to screen coordinates.
    pub fn grid_to_screen(&self, gx: f64, gy: f64, grid: &GridConfig) -> (f64, f64) {
        let scale = self.effective_scale(grid);
        let (ox, oy) = self.origin(grid);
        (
            ox + (gx + self.pan_x) * scale,
            oy + (gy + self.pan_y) * scale,
        )
    }

    /// Continuous inverse of [`Self::grid_to_screen`]. `None` for a degenerate canvas.
    pub fn screen_to_grid_f64(&self, sx: f64, sy: f64, grid: &GridConfig) -> Option<(f64, f64)> {
        self.screen_to_grid_at(self.zoom, sx, sy, grid)
    }

    fn screen_to_grid_at(
        &self,
        zoom: f64,
        sx: f64,
        sy: f64,
        grid: &GridConfig,
    ) -> Option<(f64, f64)> {
        if self.is_degenerate() {
            return None;
        }
        let scale = self.effective_scale_at(zoom, grid);
        if !(scale.is_finite() && scale > 0.0) {
            return None;
        }
        let (ox, oy) = self.origin_at(zoom, grid);
        Some(((sx - ox) / scale - self.pan_x, (sy - oy) / scale - self.pan_y))
    }

    /// Grid cell containing a screen point, floored. May lie outside the grid.
    #[allow(clippy::cast_possible_truncation)]
    pub fn screen_to_grid(&self, sx: f64, sy: f64, grid: &GridConfig) -> Option<(i64, i64)> {
        let (gx, gy) = self.screen_to_grid_f64(sx, sy, grid)?;
        if !(gx.is_finite() && gy.is_finite()) {
            return None;
        }
        // Float-to-int `as` saturates; out-of-range values stay out of bounds.
        Some((gx.floor() as i64, gy.floor() as i64))
    }

    /// Cell under a screen point, or `None` outside the grid or on a zero-sized canvas.
    pub fn hit_test(&self, sx: f64, sy: f64, grid: &GridConfig) -> Option<CellCoord> {
        let (gx, gy) = self.screen_to_grid(sx, sy, grid)?;
        if gx < 0
            || gy < 0
            || gx >= i64::from(grid.grid_width)
            || gy >= i64::from(grid.grid_height)
        {
            return None;
        }
        Some(CellCoord::new(
            u16::try_from(gx).ok()?,
            u16::try_from(gy).ok()?,
        ))
    }

    /// Clamp a pan offset for the given zoom.
    ///
    /// The allowed range is symmetric: half the grid that does not fit on
    /// screen, plus the overscroll margin. Idempotent.
    pub fn clamp_pan(&self, pan_x: f64, pan_y: f64, zoom: f64, grid: &GridConfig) -> (f64, f64) {
        let scale = self.effective_scale_at(zoom, grid);
        if self.is_degenerate() || !(scale.is_finite() && scale > 0.0) {
            return (pan_x, pan_y);
        }
        let view_w = self.width / scale;
        let view_h = self.height / scale;
        let max_x = ((grid.grid_width_f64() - view_w) / 2.0 + grid.overscroll_margin).max(0.0);
        let max_y = ((grid.grid_height_f64() - view_h) / 2.0 + grid.overscroll_margin).max(0.0);
        (clamp_finite(pan_x, max_x), clamp_finite(pan_y, max_y))
    }

    /// Same viewport with a new (clamped) pan.
    #[must_use]
    pub fn with_pan(&self, pan_x: f64, pan_y: f64, grid: &GridConfig) -> Self {
        let (pan_x, pan_y) = self.clamp_pan(pan_x, pan_y, self.zoom, grid);
        Self {
            pan_x,
            pan_y,
            ..*self
        }
    }

    /// Pan by a screen-space delta; the grid follows the pointer.
    #[must_use]
    pub fn panned_by_screen(&self, dx: f64, dy: f64, grid: &GridConfig) -> Self {
        let scale = self.effective_scale(grid);
        if self.is_degenerate() || !(scale.is_finite() && scale > 0.0) {
            return *self;
        }
        self.with_pan(self.pan_x + dx / scale, self.pan_y + dy / scale, grid)
    }

    /// Pan one step of `pan_step` screen pixels in `direction`.
    #[must_use]
    pub fn stepped(&self, direction: PanDirection, grid: &GridConfig) -> Self {
        let step = grid.pan_step;
        let (dx, dy) = match direction {
            PanDirection::Left => (step, 0.0),
            PanDirection::Right => (-step, 0.0),
            PanDirection::Up => (0.0, step),
            PanDirection::Down => (0.0, -step),
        };
        self.panned_by_screen(dx, dy, grid)
    }

    /// Zoom to `new_zoom` while keeping the grid point under `(sx, sy)` fixed.
    ///
    /// `new_zoom` is clamped to the configured bounds; an unchanged zoom returns
    /// the viewport as is. The resulting pan is clamped for the new zoom.
    #[must_use]
    pub fn zoomed_around(&self, new_zoom: f64, sx: f64, sy: f64, grid: &GridConfig) -> Self {
        let new_zoom = grid.clamp_zoom(new_zoom);
        if (new_zoom - self.zoom).abs() <= f64::EPSILON * self.zoom.abs().max(1.0) {
            return *self;
        }
        let (Some(before), Some(after)) = (
            self.screen_to_grid_at(self.zoom, sx, sy, grid),
            self.screen_to_grid_at(new_zoom, sx, sy, grid),
        ) else {
            return Self {
                zoom: new_zoom,
                ..*self
            };
        };
        let pan_x = self.pan_x + (after.0 - before.0);
        let pan_y = self.pan_y + (after.1 - before.1);
        let (pan_x, pan_y) = self.clamp_pan(pan_x, pan_y, new_zoom, grid);
        Self {
            zoom: new_zoom,
            pan_x,
            pan_y,
            ..*self
        }
    }

    /// Zoom around the canvas centre (zoom buttons and slider).
    #[must_use]
    pub fn zoomed_at_center(&self, new_zoom: f64, grid: &GridConfig) -> Self {
        self.zoomed_around(new_zoom, self.width / 2.0, self.height / 2.0, grid)
    }

    /// Resize the canvas and re-clamp the pan for the new size.
    #[must_use]
    pub fn resized(&self, width: f64, height: f64, grid: &GridConfig) -> Self {
        let resized = Self {
            width,
            height,
            ..*self
        };
        resized.with_pan(self.pan_x, self.pan_y, grid)
    }
}

fn clamp_finite(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(-max, max)
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

    fn grid(w: u32, h: u32) -> GridConfig {
        GridConfig {
            grid_width: w,
            grid_height: h,
            ..GridConfig::default()
        }
    }

    #[test]
    fn base_scale_fits_whole_grid() {
        let g = grid(100, 50);
        let vp = Viewport::new(&g, 800.0, 600.0);
        // width limits: 800/100 = 8, height 600/50 = 12
        assert_eq!(vp.base_scale(&g), 8.0);
    }

    #[test]
    fn grid_is_centered_at_zoom_one() {
        let g = grid(100, 50);
        let vp = Viewport {
            zoom: 1.0,
            ..Viewport::new(&g, 800.0, 600.0)
        };
        let (ox, oy) = vp.origin(&g);
        assert_eq!(ox, 0.0);
        assert_eq!(oy, (600.0 - 50.0 * 8.0) / 2.0);
    }

    #[test]
    fn screen_to_grid_inverts_grid_to_screen() {
        let g = grid(100, 100);
        let vp = Viewport {
            zoom: 3.0,
            pan_x: 4.5,
            pan_y: -2.25,
            width: 500.0,
            height: 400.0,
        };
        let (sx, sy) = vp.grid_to_screen(17.5, 42.5, &g);
        let (gx, gy) = vp.screen_to_grid_f64(sx, sy, &g).unwrap();
        assert!((gx - 17.5).abs() < 1e-9);
        assert!((gy - 42.5).abs() < 1e-9);
        assert_eq!(vp.screen_to_grid(sx, sy, &g), Some((17, 42)));
    }

    #[test]
    fn degenerate_canvas_hits_nothing() {
        let g = grid(10, 10);
        let vp = Viewport::new(&g, 0.0, 300.0);
        assert!(vp.is_degenerate());
        assert_eq!(vp.hit_test(1.0, 1.0, &g), None);
        assert_eq!(vp.panned_by_screen(10.0, 10.0, &g), vp);
    }

    #[test]
    fn pan_follows_pointer() {
        let g = grid(100, 100);
        let vp = Viewport::new(&g, 400.0, 400.0);
        let before = vp.screen_to_grid_f64(200.0, 200.0, &g).unwrap();
        let moved = vp.panned_by_screen(12.0, -8.0, &g);
        let after = moved.screen_to_grid_f64(212.0, 192.0, &g).unwrap();
        assert!((before.0 - after.0).abs() < 1e-9);
        assert!((before.1 - after.1).abs() < 1e-9);
    }

    #[test]
    fn step_pan_reveals_named_side() {
        let g = grid(100, 100);
        let vp = Viewport::new(&g, 400.0, 400.0);
        assert!(vp.stepped(PanDirection::Left, &g).pan_x > 0.0);
        assert!(vp.stepped(PanDirection::Down, &g).pan_y < 0.0);
    }

    #[test]
    fn resize_reclamps_pan() {
        let g = grid(100, 100);
        let vp = Viewport::new(&g, 400.0, 400.0).with_pan(1e9, 0.0, &g);
        let wide = vp.resized(4000.0, 400.0, &g);
        let (max_x, _) = wide.clamp_pan(f64::MAX, 0.0, wide.zoom, &g);
        assert_eq!(wide.pan_x, max_x);
    }
}
