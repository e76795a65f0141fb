//! Canvas 2D rendering backend.
//!
//! Replays frames through the HTML Canvas 2D API via web-sys. Filled
//! rectangles and straight lines are all the grid needs.

mod renderer;

pub use renderer::CanvasRenderer;
