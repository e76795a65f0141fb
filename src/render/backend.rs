//! Render backend trait for pluggable rendering implementations.
//!
//! A backend only replays a [`Frame`]; deciding what to draw happens in
//! [`build_frame`], which has no side effects.

use crate::error::Result;
use crate::layout::Viewport;
use crate::render::frame::{build_frame, Frame};
use crate::sync::PixelCache;
use crate::types::{CellCoord, GridConfig};

/// Everything needed to draw one frame.
pub struct RenderParams<'a> {
    pub cache: &'a PixelCache,
    pub viewport: &'a Viewport,
    pub grid: &'a GridConfig,
    pub hovered: Option<CellCoord>,
    pub selected: Option<CellCoord>,
}

/// Trait for render backends
pub trait RenderBackend {
    /// Resize the render surface (physical pixels)
    fn resize(&mut self, width: u32, height: u32, dpr: f32);

    /// Replay a prepared frame
    fn draw(&mut self, frame: &Frame) -> Result<()>;

    /// Build and draw a frame
    fn render(&mut self, params: &RenderParams) -> Result<()> {
        let frame = build_frame(params);
        self.draw(&frame)
    }

    /// Get the current width
    fn width(&self) -> u32;

    /// Get the current height
    fn height(&self) -> u32;
}
