//! Canvas 2D rendering backend.
//!
//! Implements the RenderBackend trait using HTML Canvas 2D API via web-sys.

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::error::{PixelGridError, Result};
use crate::render::backend::RenderBackend;
use crate::render::colors::palette;
use crate::render::frame::{DrawCommand, Frame};
use crate::types::CellCoord;

/// Canvas 2D renderer implementing the RenderBackend trait
pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    width: u32,
    height: u32,
    dpr: f32,
}

impl CanvasRenderer {
    /// Create a new Canvas renderer from an HtmlCanvasElement
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|_| PixelGridError::Render("Failed to get 2d context".into()))?
            .ok_or_else(|| PixelGridError::Render("No 2d context available".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| PixelGridError::Render("Failed to cast to CanvasRenderingContext2d".into()))?;

        let width = canvas.width();
        let height = canvas.height();

        Ok(Self {
            canvas,
            ctx,
            width,
            height,
            dpr: 1.0,
        })
    }

    /// Set the CSS dimensions of the canvas element (logical pixels).
    pub fn set_canvas_css_size(&self, css_w: f64, css_h: f64) {
        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{css_w}px"));
        let _ = style.set_property("height", &format!("{css_h}px"));
    }

    fn cell_rect(cell: CellCoord) -> (f64, f64) {
        (f64::from(cell.x), f64::from(cell.y))
    }

    fn draw_grid_lines(&self, cols: u32, rows: u32, color: &str, line_width: f64) {
        let cols_f = f64::from(cols);
        let rows_f = f64::from(rows);
        self.ctx.begin_path();
        for x in 0..=cols {
            let x = f64::from(x);
            self.ctx.move_to(x, 0.0);
            self.ctx.line_to(x, rows_f);
        }
        for y in 0..=rows {
            let y = f64::from(y);
            self.ctx.move_to(0.0, y);
            self.ctx.line_to(cols_f, y);
        }
        self.ctx.set_stroke_style_str(color);
        self.ctx.set_line_width(line_width);
        self.ctx.stroke();
    }

    fn apply(&self, command: &DrawCommand) {
        match command {
            DrawCommand::Clear { width, height } => {
                self.ctx.clear_rect(0.0, 0.0, *width, *height);
                self.ctx.set_fill_style_str(palette::BACKGROUND);
                self.ctx.fill_rect(0.0, 0.0, *width, *height);
            }
            DrawCommand::Transform {
                origin_x,
                origin_y,
                scale,
                pan_x,
                pan_y,
            } => {
                let _ = self.ctx.translate(*origin_x, *origin_y);
                let _ = self.ctx.scale(*scale, *scale);
                let _ = self.ctx.translate(*pan_x, *pan_y);
            }
            DrawCommand::GridLines {
                cols,
                rows,
                color,
                line_width,
            } => self.draw_grid_lines(*cols, *rows, color, *line_width),
            DrawCommand::FillCell { cell, color } => {
                let (x, y) = Self::cell_rect(*cell);
                self.ctx.set_fill_style_str(color);
                self.ctx.fill_rect(x, y, 1.0, 1.0);
            }
            DrawCommand::StrokeCell {
                cell,
                color,
                line_width,
            } => {
                let (x, y) = Self::cell_rect(*cell);
                self.ctx.set_stroke_style_str(color);
                self.ctx.set_line_width(*line_width);
                self.ctx.stroke_rect(x, y, 1.0, 1.0);
            }
        }
    }
}

impl RenderBackend for CanvasRenderer {
    fn resize(&mut self, width: u32, height: u32, dpr: f32) {
        self.width = width;
        self.height = height;
        self.dpr = dpr;

        // Set canvas buffer size to physical pixels
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn draw(&mut self, frame: &Frame) -> Result<()> {
        self.ctx
            .reset_transform()
            .map_err(|_| PixelGridError::Render("Failed to reset transform".into()))?;
        self.ctx
            .clear_rect(0.0, 0.0, f64::from(self.width), f64::from(self.height));
        if frame.is_empty() {
            return Ok(());
        }

        // Save clean state; transforms from this frame must not leak into the next.
        self.ctx.save();
        let _ = self.ctx.scale(f64::from(self.dpr), f64::from(self.dpr));
        for command in &frame.commands {
            self.apply(command);
        }
        self.ctx.restore();
        Ok(())
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}
