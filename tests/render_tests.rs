//! Rendering tests
//!
//! Checks the display list built for a frame and replays it through a
//! recording backend, so drawing is verified without a canvas.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use pixelgrid::error::Result;
use pixelgrid::layout::Viewport;
use pixelgrid::render::{build_frame, palette, DrawCommand, Frame, RenderBackend, RenderParams};
use pixelgrid::sync::PixelCache;
use pixelgrid::types::{CellCoord, CellRecord, GridConfig, Rgba};

/// Backend that keeps every frame it is asked to draw.
#[derive(Default)]
struct RecordingBackend {
    frames: Vec<Frame>,
    width: u32,
    height: u32,
}

impl RenderBackend for RecordingBackend {
    fn resize(&mut self, width: u32, height: u32, _dpr: f32) {
        self.width = width;
        self.height = height;
    }

    fn draw(&mut self, frame: &Frame) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

fn cache_of(cells: &[(u16, u16, Rgba)]) -> PixelCache {
    let mut cache = PixelCache::new();
    cache.merge(
        cells
            .iter()
            .map(|&(x, y, color)| CellRecord::new(CellCoord::new(x, y), color, "", None)),
    );
    cache
}

fn params<'a>(
    cache: &'a PixelCache,
    viewport: &'a Viewport,
    grid: &'a GridConfig,
    hovered: Option<CellCoord>,
    selected: Option<CellCoord>,
) -> RenderParams<'a> {
    RenderParams {
        cache,
        viewport,
        grid,
        hovered,
        selected,
    }
}

fn stroke_styles(frame: &Frame) -> Vec<(&'static str, f64)> {
    frame
        .commands
        .iter()
        .filter_map(|cmd| match cmd {
            DrawCommand::StrokeCell {
                color, line_width, ..
            } => Some((*color, *line_width)),
            _ => None,
        })
        .collect()
}

fn strokes(frame: &Frame) -> Vec<(CellCoord, &'static str)> {
    frame
        .commands
        .iter()
        .filter_map(|cmd| match cmd {
            DrawCommand::StrokeCell { cell, color, .. } => Some((*cell, *color)),
            _ => None,
        })
        .collect()
}

#[test]
fn frame_is_deterministic() {
    let grid = GridConfig::default();
    let viewport = Viewport::new(&grid, 1024.0, 768.0);
    let cache = cache_of(&[
        (9, 9, Rgba::opaque(1, 2, 3)),
        (0, 4, Rgba::new(10, 20, 30, 40)),
        (700, 2, Rgba::opaque(255, 255, 0)),
    ]);
    let p = params(&cache, &viewport, &grid, Some(CellCoord::new(5, 5)), Some(CellCoord::new(9, 9)));

    assert_eq!(build_frame(&p), build_frame(&p));
}

#[test]
fn frame_follows_draw_order() {
    let grid = GridConfig::default();
    let viewport = Viewport::new(&grid, 1024.0, 768.0);
    let cache = cache_of(&[(1, 1, Rgba::opaque(1, 2, 3))]);
    let frame = build_frame(&params(&cache, &viewport, &grid, None, None));

    assert!(matches!(frame.commands[0], DrawCommand::Clear { width, height } if width == 1024.0 && height == 768.0));
    assert!(matches!(frame.commands[1], DrawCommand::Transform { .. }));
    assert!(matches!(
        frame.commands[2],
        DrawCommand::GridLines { cols: 1921, rows: 1081, .. }
    ));
    assert_eq!(frame.commands.len(), 4);
}

#[test]
fn transform_matches_viewport() {
    let grid = GridConfig::default();
    let viewport = Viewport::new(&grid, 1024.0, 768.0).with_pan(12.0, -7.0, &grid);
    let cache = PixelCache::new();
    let frame = build_frame(&params(&cache, &viewport, &grid, None, None));

    let DrawCommand::Transform { origin_x, origin_y, scale, pan_x, pan_y } = frame.commands[1] else {
        panic!("expected transform, got {:?}", frame.commands[1]);
    };
    assert_eq!((origin_x, origin_y), viewport.origin(&grid));
    assert_eq!(scale, viewport.effective_scale(&grid));
    assert_eq!((pan_x, pan_y), (12.0, -7.0));
}

#[test]
fn every_cached_cell_is_filled_with_its_color() {
    let grid = GridConfig::default();
    let viewport = Viewport::new(&grid, 800.0, 600.0);
    let cache = cache_of(&[
        (3, 4, Rgba::opaque(255, 0, 0)),
        (1, 2, Rgba::new(0, 0, 255, 51)),
    ]);
    let frame = build_frame(&params(&cache, &viewport, &grid, None, None));

    let filled: Vec<_> = frame.filled_cells().collect();
    assert_eq!(
        filled,
        vec![
            (CellCoord::new(1, 2), "rgba(0,0,255,0.2)"),
            (CellCoord::new(3, 4), "rgb(255,0,0)"),
        ]
    );
}

#[test]
fn hover_on_free_cell_adds_highlight_and_outline() {
    let grid = GridConfig::default();
    let viewport = Viewport::new(&grid, 800.0, 600.0);
    let cache = cache_of(&[(3, 4, Rgba::opaque(255, 0, 0))]);
    let hovered = CellCoord::new(6, 6);
    let frame = build_frame(&params(&cache, &viewport, &grid, Some(hovered), None));

    assert!(frame
        .filled_cells()
        .any(|(cell, color)| cell == hovered && color == palette::HOVER_FILL));
    assert_eq!(strokes(&frame), vec![(hovered, palette::HOVER_OUTLINE)]);
}

#[test]
fn selection_outline_contrasts_with_cell() {
    let grid = GridConfig::default();
    let viewport = Viewport::new(&grid, 800.0, 600.0);
    let cache = cache_of(&[
        (1, 1, Rgba::opaque(255, 255, 255)),
        (2, 2, Rgba::opaque(10, 10, 10)),
    ]);

    let light = build_frame(&params(&cache, &viewport, &grid, None, Some(CellCoord::new(1, 1))));
    assert_eq!(
        strokes(&light),
        vec![(CellCoord::new(1, 1), palette::SELECTION_ON_LIGHT)]
    );

    let dark = build_frame(&params(&cache, &viewport, &grid, None, Some(CellCoord::new(2, 2))));
    assert_eq!(strokes(&dark), vec![(CellCoord::new(2, 2), palette::SELECTION)]);
}

#[test]
fn selection_is_drawn_after_hover() {
    let grid = GridConfig::default();
    let viewport = Viewport::new(&grid, 800.0, 600.0);
    let cache = PixelCache::new();
    let cell = CellCoord::new(4, 4);
    let frame = build_frame(&params(&cache, &viewport, &grid, Some(cell), Some(cell)));

    let last = frame.commands.last().unwrap();
    assert!(matches!(last, DrawCommand::StrokeCell { color, .. } if *color == palette::SELECTION));
}

#[test]
fn selected_free_cell_is_distinct_from_hover() {
    let grid = GridConfig::default();
    let viewport = Viewport::new(&grid, 800.0, 600.0);
    let cache = PixelCache::new();
    let cell = CellCoord::new(3, 3);
    let frame = build_frame(&params(&cache, &viewport, &grid, Some(cell), Some(cell)));

    let styles = stroke_styles(&frame);
    assert_eq!(styles.len(), 2);
    let (hover_color, hover_width) = styles[0];
    let (selection_color, selection_width) = styles[1];
    assert_ne!(hover_color, selection_color);
    assert!(selection_width > hover_width);
    assert!(frame
        .filled_cells()
        .any(|(c, color)| c == cell && color == palette::SELECTION_FILL));
}

#[test]
fn selected_occupied_cell_keeps_its_color_visible() {
    let grid = GridConfig::default();
    let viewport = Viewport::new(&grid, 800.0, 600.0);
    let cache = cache_of(&[(5, 5, Rgba::opaque(0, 0, 200))]);
    let frame = build_frame(&params(&cache, &viewport, &grid, None, Some(CellCoord::new(5, 5))));

    let fills: Vec<_> = frame.filled_cells().collect();
    assert_eq!(fills, vec![(CellCoord::new(5, 5), "rgb(0,0,200)")]);
}

#[test]
fn zero_sized_canvas_draws_nothing() {
    let grid = GridConfig::default();
    let viewport = Viewport::new(&grid, 0.0, 0.0);
    let cache = cache_of(&[(1, 1, Rgba::opaque(1, 1, 1))]);
    let frame = build_frame(&params(&cache, &viewport, &grid, Some(CellCoord::new(2, 2)), None));

    assert!(frame.is_empty());
}

#[test]
fn backend_render_replays_built_frame() {
    let grid = GridConfig::default();
    let viewport = Viewport::new(&grid, 640.0, 480.0);
    let cache = cache_of(&[(8, 8, Rgba::opaque(0, 200, 0))]);
    let mut backend = RecordingBackend::default();
    backend.resize(1280, 960, 2.0);

    let p = params(&cache, &viewport, &grid, None, Some(CellCoord::new(8, 8)));
    backend.render(&p).unwrap();
    backend.render(&p).unwrap();

    assert_eq!((backend.width(), backend.height()), (1280, 960));
    assert_eq!(backend.frames.len(), 2);
    assert_eq!(backend.frames[0], backend.frames[1]);
    assert_eq!(backend.frames[0], build_frame(&p));
}
