//! Codec tests
//!
//! Round-trip and wire-format checks for the packed record layout.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use pixelgrid::codec::{self, PackedRecord};
use pixelgrid::sync::RawRecord;
use pixelgrid::types::{CellCoord, CellRecord, GridConfig, Rgba};
use test_case::test_case;

/// Deterministic xorshift so the sample is reproducible.
fn xorshift(state: &mut u64) -> u64 {
    *state ^= *state << 13;
    *state ^= *state >> 7;
    *state ^= *state << 17;
    *state
}

#[test]
fn sampled_records_round_trip() {
    let mut seed = 0x9E37_79B9_7F4A_7C15;
    for _ in 0..10_000 {
        let bits = xorshift(&mut seed);
        let coord = CellCoord::new(bits as u16, (bits >> 16) as u16);
        let color = Rgba::new(
            (bits >> 32) as u8,
            (bits >> 40) as u8,
            (bits >> 48) as u8,
            (bits >> 56) as u8,
        );
        let record = CellRecord::new(coord, color, "", None);
        let wire = codec::encode(&record).to_u64();
        assert_eq!(codec::decode(PackedRecord::from_u64(wire), "", None), record);
    }
}

#[test_case(0x0000_0000_0000_0000 => (0, 0, Rgba::new(0, 0, 0, 0)); "all zero")]
#[test_case(0xFF00_00FF_0003_0004 => (3, 4, Rgba::new(255, 0, 0, 255)); "opaque red at 3,4")]
#[test_case(0x0000_FF80_0780_0438 => (1920, 1080, Rgba::new(0, 0, 255, 128)); "bottom right of fhd grid")]
#[test_case(0xFFFF_FFFF_FFFF_FFFF => (65535, 65535, Rgba::new(255, 255, 255, 255)); "all ones")]
fn wire_values_decode(wire: u64) -> (u16, u16, Rgba) {
    let record = codec::decode(PackedRecord::from_u64(wire), "", None);
    (record.x, record.y, record.color)
}

#[test_case(Rgba::new(255, 0, 0, 255) => "rgb(255,0,0)")]
#[test_case(Rgba::new(0, 128, 255, 0) => "rgba(0,128,255,0)")]
#[test_case(Rgba::new(10, 20, 30, 51) => "rgba(10,20,30,0.2)")]
fn css_colors(color: Rgba) -> String {
    color.to_css()
}

#[test]
fn raw_record_json_decodes_against_grid() {
    let json = r#"[
        {"packedColor": 4278190335, "packedPosition": 196612, "message": "gm", "owner": "0xabc"},
        {"packedColor": 255, "packedPosition": 0, "txRef": "0xfeed"}
    ]"#;
    let records: Vec<RawRecord> = serde_json::from_str(json).unwrap();
    let grid = GridConfig::default();

    let first = records[0].decode(&grid).unwrap();
    assert_eq!(first.coord(), CellCoord::new(3, 4));
    assert_eq!(first.color, Rgba::new(255, 0, 0, 255));
    assert_eq!(first.message, "gm");
    assert_eq!(first.owner.as_deref(), Some("0xabc"));

    let second = records[1].decode(&grid).unwrap();
    assert_eq!(second.color, Rgba::new(0, 0, 0, 255));
    assert_eq!(second.tx_ref.as_deref(), Some("0xfeed"));
}

#[test]
fn long_messages_are_truncated_by_chars() {
    let message = "é".repeat(150);
    let record = CellRecord::new(CellCoord::new(0, 0), Rgba::default(), &message, None);
    assert_eq!(record.message.chars().count(), 100);
    assert!(record.validate_for_encode(1921, 1081, 100).is_ok());
}

#[test]
fn encode_validation_rejects_cells_outside_grid() {
    let record = CellRecord::new(CellCoord::new(1921, 0), Rgba::default(), "", None);
    assert!(record.validate_for_encode(1921, 1081, 100).is_err());
}
