//! Data types for the pixel grid.

mod config;
mod pixel;

pub use config::*;
pub use pixel::*;
