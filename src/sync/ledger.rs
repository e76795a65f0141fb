//! Read-side interface to the external ledger.
//!
//! The ledger is addressed by dense index: record `i` for `0 <= i < total`
//! has id `RecordId(i)`. [`RecordDirectory`] is the only place that turns an
//! index or a cell into a record id.

use std::collections::HashMap;
use std::ops::Range;

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::codec::{self, PackedRecord};
use crate::error::{PixelGridError, Result};
use crate::types::{CellCoord, CellRecord, GridConfig};

/// Identifier of one ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub u64);

/// A record exactly as the ledger returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub packed_color: u32,
    pub packed_position: u32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub tx_ref: Option<String>,
}

impl RawRecord {
    pub fn from_cell(record: &CellRecord) -> Self {
        let packed = codec::encode(record);
        Self {
            packed_color: packed.color,
            packed_position: packed.position,
            message: record.message.clone(),
            owner: record.owner.clone(),
            tx_ref: record.tx_ref.clone(),
        }
    }

    pub fn packed(&self) -> PackedRecord {
        PackedRecord::new(self.packed_color, self.packed_position)
    }

    /// Decode into a cell record, rejecting cells outside the configured grid.
    pub fn decode(&self, config: &GridConfig) -> Result<CellRecord> {
        let mut record = codec::decode(self.packed(), &self.message, self.owner.as_deref());
        if u32::from(record.x) >= config.grid_width || u32::from(record.y) >= config.grid_height {
            return Err(PixelGridError::Decode(format!(
                "cell ({}, {}) outside {}x{} grid",
                record.x, record.y, config.grid_width, config.grid_height
            )));
        }
        if record.message.chars().count() > config.max_message_len {
            record.message = record.message.chars().take(config.max_message_len).collect();
        }
        record.tx_ref.clone_from(&self.tx_ref);
        Ok(record)
    }
}

/// Outcome of one record inside a bulk read.
pub type RecordOutcome = Result<RawRecord>;

/// Read path of the ledger.
///
/// `records` is a tolerant bulk read: it fails as a whole only when the call
/// itself fails, otherwise it returns one outcome per requested id, in order.
pub trait Ledger {
    fn total_count(&self) -> LocalBoxFuture<'_, Result<u64>>;

    fn record(&self, id: RecordId) -> LocalBoxFuture<'_, Result<RawRecord>>;

    fn records(&self, ids: Vec<RecordId>) -> LocalBoxFuture<'_, Result<Vec<RecordOutcome>>>;
}

/// Resolves ledger indices and cells to record ids.
#[derive(Debug, Clone, Default)]
pub struct RecordDirectory {
    by_cell: HashMap<CellCoord, RecordId>,
    /// Number of ledger records known so far.
    known_total: Option<u64>,
}

impl RecordDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_at_index(&self, index: u64) -> RecordId {
        RecordId(index)
    }

    pub fn ids_for_range(&self, range: Range<u64>) -> Vec<RecordId> {
        range.map(|index| self.id_at_index(index)).collect()
    }

    /// Id of the record last seen at `cell`, if any.
    pub fn resolve(&self, cell: CellCoord) -> Option<RecordId> {
        self.by_cell.get(&cell).copied()
    }

    pub fn remember(&mut self, cell: CellCoord, id: RecordId) {
        self.by_cell.insert(cell, id);
    }

    pub fn known_total(&self) -> Option<u64> {
        self.known_total
    }

    /// Record a total count. Never shrinks: the ledger is append-only.
    pub fn set_known_total(&mut self, total: u64) {
        self.known_total = Some(self.known_total.map_or(total, |known| known.max(total)));
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
    use crate::types::Rgba;

    #[test]
    fn raw_record_round_trips_through_cell() {
        let cell = CellRecord::new(CellCoord::new(7, 9), Rgba::new(1, 2, 3, 4), "hello", Some("0x1".into()))
            .with_tx_ref("0xdead");
        let raw = RawRecord::from_cell(&cell);
        assert_eq!(raw.decode(&GridConfig::default()).unwrap(), cell);
    }

    #[test]
    fn decode_rejects_cells_outside_grid() {
        let raw = RawRecord {
            packed_color: 0,
            packed_position: (5000 << 16) | 1,
            message: String::new(),
            owner: None,
            tx_ref: None,
        };
        assert!(matches!(
            raw.decode(&GridConfig::default()),
            Err(PixelGridError::Decode(_))
        ));
    }

    #[test]
    fn raw_record_reads_camel_case_json() {
        let raw: RawRecord =
            serde_json::from_str(r#"{"packedColor": 4278190335, "packedPosition": 65537}"#).unwrap();
        assert_eq!(raw.packed_color, 0xFF00_00FF);
        assert_eq!(raw.message, "");
        assert_eq!(raw.owner, None);
    }

    #[test]
    fn directory_uses_dense_indices() {
        let mut dir = RecordDirectory::new();
        assert_eq!(dir.ids_for_range(2..5), vec![RecordId(2), RecordId(3), RecordId(4)]);
        assert_eq!(dir.resolve(CellCoord::new(1, 1)), None);
        dir.remember(CellCoord::new(1, 1), RecordId(3));
        assert_eq!(dir.resolve(CellCoord::new(1, 1)), Some(RecordId(3)));
    }

    #[test]
    fn known_total_never_shrinks() {
        let mut dir = RecordDirectory::new();
        dir.set_known_total(10);
        dir.set_known_total(4);
        assert_eq!(dir.known_total(), Some(10));
    }
}
