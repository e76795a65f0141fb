//! Structured error types for pixelgrid.

/// All errors that can occur while syncing, decoding and rendering the grid.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PixelGridError {
    /// A ledger request failed (total count, batch call or single record).
    #[error("Ledger request failed: {0}")]
    Ledger(String),

    /// A ledger record could not be turned into a cell record.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid grid configuration.
    #[error("Invalid config: {0}")]
    Config(String),

    /// Rendering error.
    #[error("Render error: {0}")]
    Render(String),

    /// Error raised by a JavaScript collaborator.
    #[error("JavaScript error: {0}")]
    Js(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PixelGridError>;

#[cfg(target_arch = "wasm32")]
impl From<PixelGridError> for wasm_bindgen::JsValue {
    fn from(e: PixelGridError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for PixelGridError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        Self::Js(
            value
                .as_string()
                .unwrap_or_else(|| format!("{value:?}")),
        )
    }
}
