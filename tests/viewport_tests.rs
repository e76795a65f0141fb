//! Viewport and coordinate transform tests
//!
//! Clamp idempotence, zoom anchoring and hit-test boundaries on the default
//! 1921×1081 grid.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use pixelgrid::layout::{PanDirection, Viewport};
use pixelgrid::types::{CellCoord, GridConfig};
use test_case::test_case;

fn fhd() -> (GridConfig, Viewport) {
    let grid = GridConfig::default();
    let viewport = Viewport::new(&grid, 800.0, 600.0);
    (grid, viewport)
}

mod clamp {
    use super::*;

    #[test]
    fn clamp_is_idempotent() {
        let (grid, vp) = fhd();
        let pans = [
            (0.0, 0.0),
            (1e6, -1e6),
            (-3.5, 12.25),
            (f64::MAX, f64::MIN),
            (f64::INFINITY, f64::NEG_INFINITY),
            (f64::NAN, 4.0),
        ];
        for zoom in [1.0, 1.5, 10.0, 33.3, 50.0] {
            for (px, py) in pans {
                let once = vp.clamp_pan(px, py, zoom, &grid);
                let twice = vp.clamp_pan(once.0, once.1, zoom, &grid);
                assert_eq!(once, twice, "zoom {zoom}, pan ({px}, {py})");
                assert!(once.0.is_finite() && once.1.is_finite());
            }
        }
    }

    #[test]
    fn fully_visible_grid_only_moves_by_margin() {
        let (grid, vp) = fhd();
        let (px, py) = vp.clamp_pan(500.0, -500.0, grid.min_zoom, &grid);
        // At zoom 1 the grid fills the width exactly and leaves vertical room.
        assert!((px - grid.overscroll_margin).abs() < 1e-6);
        assert_eq!(py, 0.0);
    }

    #[test]
    fn allowed_range_grows_with_zoom() {
        let (grid, vp) = fhd();
        let (low, _) = vp.clamp_pan(f64::MAX, 0.0, 2.0, &grid);
        let (high, _) = vp.clamp_pan(f64::MAX, 0.0, 20.0, &grid);
        assert!(high > low);
    }
}

mod zoom {
    use super::*;
    use test_case::test_case;

    #[test_case(400.0, 300.0, 11.0)]
    #[test_case(100.0, 80.0, 25.0)]
    #[test_case(700.0, 550.0, 5.0)]
    #[test_case(399.5, 0.5, 10.5)]
    fn zoom_keeps_point_under_cursor(sx: f64, sy: f64, new_zoom: f64) {
        let (grid, vp) = fhd();
        let before = vp.screen_to_grid_f64(sx, sy, &grid).unwrap();
        let zoomed = vp.zoomed_around(new_zoom, sx, sy, &grid);
        let after = zoomed.screen_to_grid_f64(sx, sy, &grid).unwrap();

        assert_eq!(zoomed.zoom, new_zoom);
        assert!((before.0 - after.0).abs() < 1e-6, "{before:?} vs {after:?}");
        assert!((before.1 - after.1).abs() < 1e-6, "{before:?} vs {after:?}");
        assert_eq!(
            vp.hit_test(sx, sy, &grid),
            zoomed.hit_test(sx, sy, &grid)
        );
    }

    #[test]
    fn zoom_is_clamped_to_bounds() {
        let (grid, vp) = fhd();
        assert_eq!(vp.zoomed_around(500.0, 10.0, 10.0, &grid).zoom, grid.max_zoom);
        assert_eq!(vp.zoomed_around(0.01, 10.0, 10.0, &grid).zoom, grid.min_zoom);
        assert_eq!(vp.zoomed_around(f64::NAN, 10.0, 10.0, &grid).zoom, grid.min_zoom);
    }

    #[test]
    fn unchanged_zoom_is_a_no_op() {
        let (grid, vp) = fhd();
        let vp = vp.with_pan(3.0, 4.0, &grid);
        assert_eq!(vp.zoomed_around(vp.zoom, 0.0, 0.0, &grid), vp);
    }

    #[test]
    fn center_zoom_keeps_center_cell() {
        let (grid, vp) = fhd();
        let center = vp.hit_test(400.0, 300.0, &grid);
        assert_eq!(vp.zoomed_at_center(30.0, &grid).hit_test(400.0, 300.0, &grid), center);
    }
}

mod hit_test {
    use super::*;

    #[test]
    fn last_cell_is_hit_and_one_beyond_is_not() {
        let (grid, vp) = fhd();
        let last_x = f64::from(grid.grid_width - 1);
        let last_y = f64::from(grid.grid_height - 1);

        let (sx, sy) = vp.grid_to_screen(last_x + 0.5, last_y + 0.5, &grid);
        assert_eq!(vp.hit_test(sx, sy, &grid), Some(CellCoord::new(1920, 1080)));

        let (sx, sy) = vp.grid_to_screen(last_x + 1.5, last_y + 1.5, &grid);
        assert_eq!(vp.hit_test(sx, sy, &grid), None);
    }

    #[test]
    fn origin_cell_and_negative_neighbour() {
        let (grid, vp) = fhd();
        let (sx, sy) = vp.grid_to_screen(0.5, 0.5, &grid);
        assert_eq!(vp.hit_test(sx, sy, &grid), Some(CellCoord::new(0, 0)));
        let (sx, sy) = vp.grid_to_screen(-0.5, 0.5, &grid);
        assert_eq!(vp.hit_test(sx, sy, &grid), None);
    }

    #[test]
    fn zero_sized_canvas_is_a_no_op() {
        let grid = GridConfig::default();
        let vp = Viewport::new(&grid, 800.0, 0.0);
        assert_eq!(vp.hit_test(10.0, 10.0, &grid), None);
        assert_eq!(vp.screen_to_grid(10.0, 10.0, &grid), None);
        assert_eq!(vp.stepped(PanDirection::Up, &grid), vp);
    }
}

mod pan {
    use super::*;

    #[test]
    fn step_moves_by_pan_step_pixels() {
        let (grid, vp) = fhd();
        let scale = vp.effective_scale(&grid);
        let stepped = vp.stepped(PanDirection::Right, &grid);
        assert!((stepped.pan_x - (-grid.pan_step / scale)).abs() < 1e-9);
        assert_eq!(stepped.pan_y, 0.0);
    }

    #[test]
    fn drag_pan_is_clamped() {
        let (grid, vp) = fhd();
        let dragged = vp.panned_by_screen(1e9, 0.0, &grid);
        let (max_x, _) = vp.clamp_pan(f64::MAX, 0.0, vp.zoom, &grid);
        assert_eq!(dragged.pan_x, max_x);
    }
}
