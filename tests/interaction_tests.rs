//! Interaction controller tests
//!
//! Click vs. drag disambiguation, hover feedback and wheel zoom, driven
//! through the pure controller without a DOM.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use pixelgrid::layout::Viewport;
use pixelgrid::sync::PixelCache;
use pixelgrid::types::{CellCoord, CellRecord, GridConfig, Rgba};
use pixelgrid::viewer::{Cursor, InteractionController, Outcome};

/// 20×20 grid on a 200×200 canvas at zoom 2: 20px per cell, grid origin at -100px.
fn setup() -> (GridConfig, InteractionController) {
    let grid = GridConfig {
        grid_width: 20,
        grid_height: 20,
        initial_zoom: 2.0,
        ..GridConfig::default()
    };
    let controller = InteractionController::new(Viewport::new(&grid, 200.0, 200.0));
    (grid, controller)
}

fn center_of(ctl: &InteractionController, grid: &GridConfig, x: u16, y: u16) -> (f64, f64) {
    ctl.viewport()
        .grid_to_screen(f64::from(x) + 0.5, f64::from(y) + 0.5, grid)
}

fn selections(outcomes: &[Outcome]) -> Vec<CellCoord> {
    outcomes.iter().filter_map(|o| o.selected).collect()
}

mod click_vs_drag {
    use super::*;

    #[test]
    fn drag_past_threshold_pans_without_selecting() {
        let (grid, mut ctl) = setup();
        let cache = PixelCache::new();
        let (x, y) = center_of(&ctl, &grid, 5, 5);
        let pan_before = (ctl.viewport().pan_x, ctl.viewport().pan_y);

        let mut outcomes = vec![ctl.pointer_down(x, y, &grid)];
        outcomes.push(ctl.pointer_move(x + 20.0, y + 10.0, &grid, &cache));
        outcomes.push(ctl.pointer_move(x + 40.0, y + 20.0, &grid, &cache));
        outcomes.push(ctl.pointer_up(x + 40.0, y + 20.0, &grid));

        assert!(selections(&outcomes).is_empty());
        assert_ne!((ctl.viewport().pan_x, ctl.viewport().pan_y), pan_before);
        assert_eq!(outcomes[1].cursor, Some(Cursor::Grabbing));
        assert_eq!(ctl.selected(), None);
        assert!(!ctl.is_dragging());
    }

    #[test]
    fn press_and_release_on_same_cell_selects_once() {
        let (grid, mut ctl) = setup();
        let (x, y) = center_of(&ctl, &grid, 5, 5);

        let outcomes = [ctl.pointer_down(x, y, &grid), ctl.pointer_up(x, y, &grid)];

        assert_eq!(selections(&outcomes), vec![CellCoord::new(5, 5)]);
        assert_eq!(ctl.selected(), Some(CellCoord::new(5, 5)));
        assert!(outcomes[1].needs_render);
    }

    #[test]
    fn release_on_other_cell_without_drag_selects_nothing() {
        let (grid, mut ctl) = setup();
        let (_, y) = center_of(&ctl, &grid, 5, 5);
        // 2px crosses into cell 6 without leaving the 3px threshold.
        let edge = ctl.viewport().grid_to_screen(6.0, 5.5, &grid);

        ctl.pointer_down(edge.0 - 1.0, y, &grid);
        let up = ctl.pointer_up(edge.0 + 1.0, y, &grid);

        assert_eq!(up.selected, None);
        assert_eq!(ctl.selected(), None);
    }

    #[test]
    fn grid_follows_pointer_during_drag() {
        let (grid, mut ctl) = setup();
        let cache = PixelCache::new();
        let (x, y) = center_of(&ctl, &grid, 8, 8);

        ctl.pointer_down(x, y, &grid);
        ctl.pointer_move(x + 30.0, y - 30.0, &grid, &cache);

        assert_eq!(
            ctl.viewport().hit_test(x + 30.0, y - 30.0, &grid),
            Some(CellCoord::new(8, 8))
        );
    }
}

mod hover {
    use super::*;

    #[test]
    fn hover_is_not_updated_while_dragging() {
        let (grid, mut ctl) = setup();
        let cache = PixelCache::new();
        let (x, y) = center_of(&ctl, &grid, 2, 2);

        ctl.pointer_down(x, y, &grid);
        ctl.pointer_move(x + 50.0, y, &grid, &cache);
        assert_eq!(ctl.hovered(), None);

        ctl.pointer_up(x + 50.0, y, &grid);
        ctl.pointer_move(x + 50.0, y, &grid, &cache);
        assert!(ctl.hovered().is_some());
    }

    #[test]
    fn press_clears_hover_highlight() {
        let (grid, mut ctl) = setup();
        let cache = PixelCache::new();
        let (x, y) = center_of(&ctl, &grid, 2, 2);

        ctl.pointer_move(x, y, &grid, &cache);
        assert_eq!(ctl.hovered(), Some(CellCoord::new(2, 2)));

        let down = ctl.pointer_down(x, y, &grid);
        assert!(down.needs_render);
        assert_eq!(ctl.hovered(), None);

        ctl.pointer_move(x + 60.0, y, &grid, &cache);
        assert_eq!(ctl.hovered(), None);
    }

    #[test]
    fn occupied_cells_get_default_cursor() {
        let (grid, mut ctl) = setup();
        let mut cache = PixelCache::new();
        cache.upsert(CellRecord::new(
            CellCoord::new(4, 4),
            Rgba::opaque(9, 9, 9),
            "taken",
            None,
        ));

        let (x, y) = center_of(&ctl, &grid, 4, 4);
        assert_eq!(
            ctl.pointer_move(x, y, &grid, &cache).cursor,
            Some(Cursor::Default)
        );
        let (x, y) = center_of(&ctl, &grid, 4, 5);
        assert_eq!(
            ctl.pointer_move(x, y, &grid, &cache).cursor,
            Some(Cursor::Pointer)
        );
        assert_eq!(ctl.hovered(), Some(CellCoord::new(4, 5)));
    }
}

mod wheel {
    use super::*;

    #[test]
    fn wheel_up_zooms_in_around_pointer() {
        let (grid, mut ctl) = setup();
        let (x, y) = center_of(&ctl, &grid, 7, 3);
        let out = ctl.wheel(-120.0, x, y, &grid);

        assert!(out.needs_render);
        assert!((ctl.viewport().zoom - 2.2).abs() < 1e-9);
        assert_eq!(ctl.viewport().hit_test(x, y, &grid), Some(CellCoord::new(7, 3)));
    }

    #[test]
    fn wheel_at_max_zoom_needs_no_render() {
        let (grid, mut ctl) = setup();
        ctl.set_zoom(grid.max_zoom, &grid);
        assert!(!ctl.wheel(-1.0, 100.0, 100.0, &grid).needs_render);
    }
}
