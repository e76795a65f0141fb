//! Viewport geometry for the pixel grid.
//!
//! This module handles:
//! - Mapping between screen coordinates and grid cells (hit-testing)
//! - Zoom clamping and zooming around a fixed screen point
//! - Pan clamping so the grid cannot be dragged arbitrarily far off-screen

mod viewport;

pub use viewport::{PanDirection, Viewport};
