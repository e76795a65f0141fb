//! Packing and unpacking of ledger cell records.
//!
//! A packed record is a single `u64`:
//!
//! ```text
//!  63        56 55      48 47      40 39      32 31            16 15             0
//! +------------+----------+----------+----------+----------------+----------------+
//! |     R      |    G     |    B     |    A     |       X        |       Y        |
//! +------------+----------+----------+----------+----------------+----------------+
//!  \_____________ color field (u32) ___________/ \______ position field (u32) ____/
//! ```
//!
//! `x` lives in the high half of the position field everywhere in this crate.
//! Message and owner travel next to the packed value, never inside it.

use crate::types::{CellCoord, CellRecord, Rgba};

/// Packed color and position as delivered by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedRecord {
    pub color: u32,
    pub position: u32,
}

impl PackedRecord {
    pub const fn new(color: u32, position: u32) -> Self {
        Self { color, position }
    }

    /// Split a 64-bit wire value into its color and position fields.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_u64(packed: u64) -> Self {
        Self {
            color: (packed >> 32) as u32,
            position: packed as u32,
        }
    }

    pub const fn to_u64(self) -> u64 {
        ((self.color as u64) << 32) | self.position as u64
    }
}

/// Pack four channels MSB first as R, G, B, A.
pub const fn pack_color(color: Rgba) -> u32 {
    u32::from_be_bytes([color.r, color.g, color.b, color.a])
}

pub const fn unpack_color(packed: u32) -> Rgba {
    let [r, g, b, a] = packed.to_be_bytes();
    Rgba { r, g, b, a }
}

/// Pack a position as `(x << 16) | y`.
pub const fn pack_position(coord: CellCoord) -> u32 {
    ((coord.x as u32) << 16) | coord.y as u32
}

#[allow(clippy::cast_possible_truncation)]
pub const fn unpack_position(packed: u32) -> CellCoord {
    CellCoord {
        x: (packed >> 16) as u16,
        y: packed as u16,
    }
}

/// Decode a packed record plus its out-of-band fields.
pub fn decode(packed: PackedRecord, message: &str, owner: Option<&str>) -> CellRecord {
    CellRecord::new(
        unpack_position(packed.position),
        unpack_color(packed.color),
        message,
        owner.map(str::to_string),
    )
}

/// Exact inverse of [`decode`] for the packed fields.
pub fn encode(record: &CellRecord) -> PackedRecord {
    PackedRecord {
        color: pack_color(record.color),
        position: pack_position(record.coord()),
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
    fn x_is_high_half_of_position() {
        let packed = PackedRecord::new(0, 0x0003_0004);
        let record = decode(packed, "", None);
        assert_eq!((record.x, record.y), (3, 4));
    }

    #[test]
    fn color_is_msb_first() {
        let record = decode(PackedRecord::new(0x11_22_33_44, 0), "", None);
        assert_eq!(record.color, Rgba::new(0x11, 0x22, 0x33, 0x44));
    }

    #[test]
    fn u64_split_puts_color_high() {
        let packed = PackedRecord::from_u64(0xAABB_CCDD_0001_0002);
        assert_eq!(packed.color, 0xAABB_CCDD);
        assert_eq!(packed.position, 0x0001_0002);
        assert_eq!(packed.to_u64(), 0xAABB_CCDD_0001_0002);
    }

    #[test]
    fn decode_keeps_out_of_band_fields() {
        let record = decode(PackedRecord::new(0xFF00_00FF, 0x0001_0001), "gm", Some("0xabc"));
        assert_eq!(record.message, "gm");
        assert_eq!(record.owner.as_deref(), Some("0xabc"));
        assert_eq!(record.tx_ref, None);
    }

    #[test]
    fn extremes_round_trip() {
        for (x, y) in [(0, 0), (65535, 65535), (0, 65535), (65535, 0)] {
            for color in [Rgba::new(0, 0, 0, 0), Rgba::new(255, 255, 255, 255), Rgba::new(1, 128, 254, 7)] {
                let record = CellRecord::new(CellCoord::new(x, y), color, "", None);
                assert_eq!(decode(encode(&record), "", None), record);
            }
        }
    }
}
