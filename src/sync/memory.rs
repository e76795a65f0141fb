//! In-memory ledger backed by a vector of raw records.
//!
//! Used by the CLI and by tests. Records can be appended or rewritten after
//! construction to simulate confirmed writes.

use std::cell::RefCell;

use futures::future::{FutureExt, LocalBoxFuture};

use super::ledger::{Ledger, RawRecord, RecordId, RecordOutcome};
use crate::error::{PixelGridError, Result};

#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: RefCell<Vec<RawRecord>>,
}

impl MemoryLedger {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            records: RefCell::new(records),
        }
    }

    /// Append a freshly minted record; returns its id.
    pub fn push(&self, record: RawRecord) -> RecordId {
        let mut records = self.records.borrow_mut();
        records.push(record);
        RecordId(records.len() as u64 - 1)
    }

    /// Overwrite an existing record (an update write).
    pub fn replace(&self, id: RecordId, record: RawRecord) -> Result<()> {
        let mut records = self.records.borrow_mut();
        let slot = usize::try_from(id.0)
            .ok()
            .and_then(|idx| records.get_mut(idx))
            .ok_or_else(|| PixelGridError::Ledger(format!("no record {}", id.0)))?;
        *slot = record;
        Ok(())
    }

    fn lookup(&self, id: RecordId) -> Result<RawRecord> {
        usize::try_from(id.0)
            .ok()
            .and_then(|idx| self.records.borrow().get(idx).cloned())
            .ok_or_else(|| PixelGridError::Ledger(format!("no record {}", id.0)))
    }
}

impl Ledger for MemoryLedger {
    fn total_count(&self) -> LocalBoxFuture<'_, Result<u64>> {
        let total = self.records.borrow().len() as u64;
        futures::future::ready(Ok(total)).boxed_local()
    }

    fn record(&self, id: RecordId) -> LocalBoxFuture<'_, Result<RawRecord>> {
        futures::future::ready(self.lookup(id)).boxed_local()
    }

    fn records(&self, ids: Vec<RecordId>) -> LocalBoxFuture<'_, Result<Vec<RecordOutcome>>> {
        let outcomes = ids.into_iter().map(|id| self.lookup(id)).collect();
        futures::future::ready(Ok(outcomes)).boxed_local()
    }
}
