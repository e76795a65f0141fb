//! Rendering of the pixel grid.
//!
//! This module provides:
//! - A pure display-list builder (`frame`)
//! - The backend trait and the Canvas 2D backend
//! - Palette and color helpers

pub mod backend;
pub mod canvas;
pub mod colors;
pub mod frame;

// Re-export commonly used types
pub use backend::{RenderBackend, RenderParams};
pub use canvas::CanvasRenderer;
pub use colors::palette;
pub use frame::{build_frame, DrawCommand, Frame};
