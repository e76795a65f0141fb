use serde::{Deserialize, Serialize};

use crate::error::{PixelGridError, Result};

/// Maximum number of characters kept in a cell message.
pub const MAX_MESSAGE_LEN: usize = 100;

/// Integer address of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: u16,
    pub y: u16,
}

impl CellCoord {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// RGBA color with one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from RGB channels.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Alpha normalized to `0.0..=1.0`.
    pub fn alpha_unit(self) -> f64 {
        f64::from(self.a) / 255.0
    }

    /// CSS color string usable as a Canvas 2D fill style.
    pub fn to_css(self) -> String {
        if self.a == 255 {
            format!("rgb({},{},{})", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({},{},{},{})",
                self.r,
                self.g,
                self.b,
                self.alpha_unit()
            )
        }
    }

    /// Format as `#RRGGBBAA`.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (the `#` is optional).
    /// Returns None if the format is invalid.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        let channel = |range: std::ops::Range<usize>| -> Option<u8> {
            u8::from_str_radix(hex.get(range)?, 16).ok()
        };
        match hex.len() {
            6 => Some(Self::opaque(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Some(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => None,
        }
    }
}

/// A decoded ledger record: one colored, owned cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRecord {
    pub x: u16,
    pub y: u16,
    pub color: Rgba,
    pub message: String,
    /// Opaque owner identity (e.g. an account address).
    pub owner: Option<String>,
    /// Reference to the external transaction that last wrote this cell.
    pub tx_ref: Option<String>,
}

impl CellRecord {
    /// Build a record, truncating the message to [`MAX_MESSAGE_LEN`] characters.
    pub fn new(coord: CellCoord, color: Rgba, message: &str, owner: Option<String>) -> Self {
        Self {
            x: coord.x,
            y: coord.y,
            color,
            message: truncate_message(message, MAX_MESSAGE_LEN),
            owner,
            tx_ref: None,
        }
    }

    pub fn coord(&self) -> CellCoord {
        CellCoord::new(self.x, self.y)
    }

    #[must_use]
    pub fn with_tx_ref(mut self, tx_ref: impl Into<String>) -> Self {
        self.tx_ref = Some(tx_ref.into());
        self
    }

    /// Check that the record fits a `width × height` grid and the message limit.
    ///
    /// The codec itself accepts any `u16` coordinate; callers run this before
    /// encoding a record that is about to be written.
    pub fn validate_for_encode(&self, width: u32, height: u32, max_message_len: usize) -> Result<()> {
        if u32::from(self.x) >= width || u32::from(self.y) >= height {
            return Err(PixelGridError::Decode(format!(
                "cell ({}, {}) outside {width}x{height} grid",
                self.x, self.y
            )));
        }
        let chars = self.message.chars().count();
        if chars > max_message_len {
            return Err(PixelGridError::Decode(format!(
                "message has {chars} chars, limit is {max_message_len}"
            )));
        }
        Ok(())
    }
}

fn truncate_message(message: &str, limit: usize) -> String {
    match message.char_indices().nth(limit) {
        Some((byte_idx, _)) => message.get(..byte_idx).unwrap_or(message).to_string(),
        None => message.to_string(),
    }
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

    #[test]
    fn css_uses_normalized_alpha() {
        assert_eq!(Rgba::opaque(255, 0, 0).to_css(), "rgb(255,0,0)");
        assert_eq!(Rgba::new(0, 0, 0, 0).to_css(), "rgba(0,0,0,0)");
        assert!(Rgba::new(1, 2, 3, 51).to_css().starts_with("rgba(1,2,3,0.2"));
    }

    #[test]
    fn hex_round_trip() {
        let c = Rgba::new(0x12, 0xAB, 0x00, 0x7F);
        assert_eq!(c.to_hex(), "#12AB007F");
        assert_eq!(Rgba::from_hex(&c.to_hex()), Some(c));
        assert_eq!(Rgba::from_hex("FF7F00"), Some(Rgba::opaque(255, 127, 0)));
        assert_eq!(Rgba::from_hex("#GG0000"), None);
        assert_eq!(Rgba::from_hex("#FFF"), None);
    }

    #[test]
    fn message_is_truncated_by_chars() {
        let long = "é".repeat(MAX_MESSAGE_LEN + 5);
        let record = CellRecord::new(CellCoord::new(1, 2), Rgba::default(), &long, None);
        assert_eq!(record.message.chars().count(), MAX_MESSAGE_LEN);
    }

    #[test]
    fn validate_rejects_out_of_grid_cells() {
        let record = CellRecord::new(CellCoord::new(1921, 0), Rgba::default(), "hi", None);
        assert!(record.validate_for_encode(1921, 1081, MAX_MESSAGE_LEN).is_err());
        let record = CellRecord::new(CellCoord::new(1920, 1080), Rgba::default(), "hi", None);
        assert!(record.validate_for_encode(1921, 1081, MAX_MESSAGE_LEN).is_ok());
    }
}
