//! Display-list construction for one frame.
//!
//! `build_frame` turns the cache, viewport, hover and selection into an
//! ordered list of draw commands. It is pure: equal inputs give equal frames,
//! which keeps the drawing logic testable without a canvas.
//!
//! Commands after `Transform` are in grid units: one cell is a 1×1 square.

use crate::layout::Viewport;
use crate::render::backend::RenderParams;
use crate::render::colors::{palette, selection_outline};
use crate::types::CellCoord;

/// Screen-pixel widths of the overlay strokes.
const GRID_LINE_PX: f64 = 1.0;
const HOVER_OUTLINE_PX: f64 = 2.0;
const SELECTION_OUTLINE_PX: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Clear the whole canvas (logical pixels).
    Clear { width: f64, height: f64 },
    /// `translate(origin) · scale(scale) · translate(pan)`
    Transform {
        origin_x: f64,
        origin_y: f64,
        scale: f64,
        pan_x: f64,
        pan_y: f64,
    },
    /// Vertical lines at `0..=cols` and horizontal lines at `0..=rows`.
    GridLines {
        cols: u32,
        rows: u32,
        color: &'static str,
        line_width: f64,
    },
    FillCell { cell: CellCoord, color: String },
    StrokeCell {
        cell: CellCoord,
        color: &'static str,
        line_width: f64,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Every filled cell in draw order, overlay fills included.
    pub fn filled_cells(&self) -> impl Iterator<Item = (CellCoord, &str)> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::FillCell { cell, color } => Some((*cell, color.as_str())),
            _ => None,
        })
    }
}

/// Build the draw list. A zero-sized canvas yields an empty frame.
pub fn build_frame(params: &RenderParams) -> Frame {
    let viewport: &Viewport = params.viewport;
    let grid = params.grid;
    if viewport.is_degenerate() {
        return Frame::default();
    }
    let scale = viewport.effective_scale(grid);
    if !(scale.is_finite() && scale > 0.0) {
        return Frame::default();
    }
    let (origin_x, origin_y) = viewport.origin(grid);
    // Convert screen-pixel stroke widths to grid units.
    let px = 1.0 / scale;

    let mut commands = Vec::with_capacity(params.cache.len() + 5);
    commands.push(DrawCommand::Clear {
        width: viewport.width,
        height: viewport.height,
    });
    commands.push(DrawCommand::Transform {
        origin_x,
        origin_y,
        scale,
        pan_x: viewport.pan_x,
        pan_y: viewport.pan_y,
    });
    commands.push(DrawCommand::GridLines {
        cols: grid.grid_width,
        rows: grid.grid_height,
        color: palette::GRID_LINE,
        line_width: GRID_LINE_PX * px,
    });

    commands.extend(params.cache.iter().map(|record| DrawCommand::FillCell {
        cell: record.coord(),
        color: record.color.to_css(),
    }));

    if let Some(hovered) = params.hovered {
        if !params.cache.is_occupied(hovered) {
            commands.push(DrawCommand::FillCell {
                cell: hovered,
                color: palette::HOVER_FILL.to_string(),
            });
            commands.push(DrawCommand::StrokeCell {
                cell: hovered,
                color: palette::HOVER_OUTLINE,
                line_width: HOVER_OUTLINE_PX * px,
            });
        }
    }

    if let Some(selected) = params.selected {
        let under = params.cache.get(selected).map(|record| record.color);
        if under.is_none() {
            commands.push(DrawCommand::FillCell {
                cell: selected,
                color: palette::SELECTION_FILL.to_string(),
            });
        }
        commands.push(DrawCommand::StrokeCell {
            cell: selected,
            color: selection_outline(under),
            line_width: SELECTION_OUTLINE_PX * px,
        });
    }

    Frame { commands }
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
    use crate::sync::PixelCache;
    use crate::types::{CellRecord, GridConfig, Rgba};

    fn cache_with(cells: &[(u16, u16)]) -> PixelCache {
        let mut cache = PixelCache::new();
        cache.merge(cells.iter().map(|&(x, y)| {
            CellRecord::new(CellCoord::new(x, y), Rgba::opaque(200, 0, 0), "", None)
        }));
        cache
    }

    #[test]
    fn stroke_widths_are_constant_on_screen() {
        let grid = GridConfig {
            grid_width: 10,
            grid_height: 10,
            ..GridConfig::default()
        };
        let cache = PixelCache::new();
        let viewport = Viewport {
            zoom: 2.0,
            pan_x: 0.0,
            pan_y: 0.0,
            width: 100.0,
            height: 100.0,
        };
        let frame = build_frame(&RenderParams {
            cache: &cache,
            viewport: &viewport,
            grid: &grid,
            hovered: None,
            selected: None,
        });
        // scale = 10 * 2 = 20 px per cell
        let Some(DrawCommand::GridLines { line_width, .. }) = frame.commands.get(2) else {
            panic!("expected grid lines, got {:?}", frame.commands.get(2));
        };
        assert!((line_width * 20.0 - GRID_LINE_PX).abs() < 1e-12);
    }

    #[test]
    fn hover_over_occupied_cell_draws_nothing_extra() {
        let grid = GridConfig::default();
        let cache = cache_with(&[(2, 2)]);
        let viewport = Viewport::new(&grid, 800.0, 600.0);
        let frame = build_frame(&RenderParams {
            cache: &cache,
            viewport: &viewport,
            grid: &grid,
            hovered: Some(CellCoord::new(2, 2)),
            selected: None,
        });
        assert_eq!(frame.commands.len(), 4);
        assert_eq!(frame.filled_cells().count(), 1);
    }
}
