//! Keyed cell cache filled by the batch loader.
//!
//! Entries are append-or-replace only: a later write for the same `(x, y)`
//! replaces the earlier one, nothing is ever removed. Iteration is ordered by
//! `(x, y)` so a frame built from the cache is deterministic.

use std::collections::BTreeMap;

use crate::types::{CellCoord, CellRecord};

#[derive(Debug, Clone, Default)]
pub struct PixelCache {
    entries: BTreeMap<CellCoord, CellRecord>,
}

impl PixelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record at its own coordinate.
    /// Returns the record previously stored there.
    pub fn upsert(&mut self, record: CellRecord) -> Option<CellRecord> {
        self.entries.insert(record.coord(), record)
    }

    /// Merge many records, last write wins per key. Returns how many were merged.
    pub fn merge(&mut self, records: impl IntoIterator<Item = CellRecord>) -> usize {
        let mut merged = 0;
        for record in records {
            self.entries.insert(record.coord(), record);
            merged += 1;
        }
        merged
    }

    pub fn get(&self, coord: CellCoord) -> Option<&CellRecord> {
        self.entries.get(&coord)
    }

    /// Whether a cell has been minted.
    pub fn is_occupied(&self, coord: CellCoord) -> bool {
        self.entries.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellRecord> {
        self.entries.values()
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

    fn record(x: u16, y: u16, color: Rgba) -> CellRecord {
        CellRecord::new(CellCoord::new(x, y), color, "", None)
    }

    #[test]
    fn upsert_replaces_same_key() {
        let mut cache = PixelCache::new();
        assert!(cache.upsert(record(3, 4, Rgba::opaque(1, 1, 1))).is_none());
        let previous = cache.upsert(record(3, 4, Rgba::opaque(2, 2, 2)));
        assert_eq!(previous.unwrap().color, Rgba::opaque(1, 1, 1));
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get(CellCoord::new(3, 4)).unwrap().color,
            Rgba::opaque(2, 2, 2)
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let mut cache = PixelCache::new();
        let batch = vec![record(0, 0, Rgba::default()), record(1, 0, Rgba::default())];
        cache.merge(batch.clone());
        cache.merge(batch);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn iteration_is_ordered() {
        let mut cache = PixelCache::new();
        cache.merge([record(5, 0, Rgba::default()), record(1, 9, Rgba::default())]);
        let coords: Vec<_> = cache.iter().map(CellRecord::coord).collect();
        assert_eq!(coords, vec![CellCoord::new(1, 9), CellCoord::new(5, 0)]);
    }
}
