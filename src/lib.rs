//! pixelgrid - pixel grid viewer for the web
//!
//! Renders a large grid of individually owned, colored cells via WebAssembly
//! and Canvas 2D:
//! - Compact 64-bit record codec (color + position)
//! - Incremental, cancellable batch sync from an external ledger
//! - Zoom/pan viewport with pointer, wheel and keyboard interaction
//! - Pure display-list rendering, testable without a canvas
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { PixelGridView } from 'pixelgrid';
//! await init();
//! const view = new PixelGridView(canvas, ledger, { gridWidth: 1921 }, devicePixelRatio);
//! view.setRenderCallback(() => requestAnimationFrame(() => view.render()));
//! view.setCellSelectedCallback((x, y) => openMintDialog(x, y));
//! view.startSync();
//! ```

pub mod codec;
pub mod error;
pub mod logging;
pub mod types;

// Grid state and rendering
pub mod layout;
pub mod render;
pub mod sync;
pub mod viewer;

use serde::Serialize;
use wasm_bindgen::prelude::*;

// Re-export the main viewer struct
#[cfg(target_arch = "wasm32")]
pub use viewer::PixelGridView;

pub use error::PixelGridError;
pub use types::*;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecodedCell {
    x: u16,
    y: u16,
    r: u8,
    g: u8,
    b: u8,
    a: u8,
    css: String,
}

/// Decode a packed ledger record into `{ x, y, r, g, b, a, css }`.
///
/// # Errors
/// Returns an error if the result cannot be converted to a JS value.
#[wasm_bindgen(js_name = "decodeRecord")]
pub fn decode_record(packed_color: u32, packed_position: u32) -> std::result::Result<JsValue, JsValue> {
    let record = codec::decode(codec::PackedRecord::new(packed_color, packed_position), "", None);
    let cell = DecodedCell {
        x: record.x,
        y: record.y,
        r: record.color.r,
        g: record.color.g,
        b: record.color.b,
        a: record.color.a,
        css: record.color.to_css(),
    };
    serde_wasm_bindgen::to_value(&cell)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

/// Pack a color for a mint or update call.
#[must_use]
#[wasm_bindgen(js_name = "packColor")]
pub fn pack_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    codec::pack_color(Rgba::new(r, g, b, a))
}

/// Pack a cell position as `(x << 16) | y`.
#[must_use]
#[wasm_bindgen(js_name = "packPosition")]
pub fn pack_position(x: u16, y: u16) -> u32 {
    codec::pack_position(CellCoord::new(x, y))
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
