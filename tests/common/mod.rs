//! Common test utilities.
//!
//! `FakeLedger` is an in-memory ledger with failure injection and call
//! recording, used by the sync tests.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{FutureExt, LocalBoxFuture};
use pixelgrid::error::{PixelGridError, Result};
use pixelgrid::sync::{Ledger, RawRecord, RecordId, RecordOutcome};
use pixelgrid::types::{CellCoord, CellRecord, GridConfig, Rgba};

type BatchHook = Box<dyn Fn(&[RecordId])>;

/// Returns `Pending` once, waking itself, so other futures in a join run.
#[derive(Default)]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Build a raw ledger record for a cell.
pub fn raw(x: u16, y: u16, color: Rgba) -> RawRecord {
    RawRecord::from_cell(&CellRecord::new(CellCoord::new(x, y), color, "", None))
}

/// `count` opaque records on row 0, each with a distinct red channel.
pub fn row_of(count: u16) -> Vec<RawRecord> {
    (0..count)
        .map(|x| raw(x, 0, Rgba::opaque(x as u8, 0, 0)))
        .collect()
}

/// A 20×20 grid that loads in batches of `batch_size`.
pub fn small_config(batch_size: u32) -> GridConfig {
    GridConfig {
        grid_width: 20,
        grid_height: 20,
        batch_size,
        ..GridConfig::default()
    }
}

#[derive(Default)]
pub struct FakeLedger {
    records: RefCell<Vec<RawRecord>>,
    failing_indices: RefCell<HashSet<u64>>,
    /// Remaining total-count calls that fail; `u32::MAX` fails forever.
    total_failures: Cell<u32>,
    failing_batch_start: Cell<Option<u64>>,
    total_calls: Cell<u32>,
    batch_calls: RefCell<Vec<Vec<RecordId>>>,
    single_calls: RefCell<Vec<RecordId>>,
    on_batch: RefCell<Option<BatchHook>>,
    yield_batches: Cell<bool>,
}

impl FakeLedger {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            records: RefCell::new(records),
            ..Self::default()
        }
    }

    /// Per-record failure inside bulk reads.
    pub fn fail_index(&self, index: u64) {
        self.failing_indices.borrow_mut().insert(index);
    }

    /// Fail the next `times` total-count requests.
    pub fn fail_total(&self, times: u32) {
        self.total_failures.set(times);
    }

    /// Make the bulk call starting at `start` throw as a whole.
    pub fn fail_batch_at(&self, start: u64) {
        self.failing_batch_start.set(Some(start));
    }

    /// Run `hook` synchronously whenever a bulk read is issued.
    pub fn on_batch(&self, hook: impl Fn(&[RecordId]) + 'static) {
        *self.on_batch.borrow_mut() = Some(Box::new(hook));
    }

    /// Make every bulk read suspend once before resolving.
    pub fn yield_between_batches(&self) {
        self.yield_batches.set(true);
    }

    pub fn push(&self, record: RawRecord) {
        self.records.borrow_mut().push(record);
    }

    pub fn replace(&self, index: usize, record: RawRecord) {
        self.records.borrow_mut()[index] = record;
    }

    pub fn total_calls(&self) -> u32 {
        self.total_calls.get()
    }

    pub fn batch_calls(&self) -> Vec<Vec<RecordId>> {
        self.batch_calls.borrow().clone()
    }

    pub fn single_calls(&self) -> Vec<RecordId> {
        self.single_calls.borrow().clone()
    }

    fn lookup(&self, id: RecordId) -> Result<RawRecord> {
        if self.failing_indices.borrow().contains(&id.0) {
            return Err(PixelGridError::Ledger(format!("record {} reverted", id.0)));
        }
        self.records
            .borrow()
            .get(id.0 as usize)
            .cloned()
            .ok_or_else(|| PixelGridError::Ledger(format!("no record {}", id.0)))
    }
}

impl Ledger for FakeLedger {
    fn total_count(&self) -> LocalBoxFuture<'_, Result<u64>> {
        self.total_calls.set(self.total_calls.get() + 1);
        let remaining = self.total_failures.get();
        let result = if remaining > 0 {
            if remaining != u32::MAX {
                self.total_failures.set(remaining - 1);
            }
            Err(PixelGridError::Ledger("rpc timeout".into()))
        } else {
            Ok(self.records.borrow().len() as u64)
        };
        futures::future::ready(result).boxed_local()
    }

    fn record(&self, id: RecordId) -> LocalBoxFuture<'_, Result<RawRecord>> {
        self.single_calls.borrow_mut().push(id);
        futures::future::ready(self.lookup(id)).boxed_local()
    }

    fn records(&self, ids: Vec<RecordId>) -> LocalBoxFuture<'_, Result<Vec<RecordOutcome>>> {
        self.batch_calls.borrow_mut().push(ids.clone());
        if let Some(hook) = self.on_batch.borrow().as_ref() {
            hook(&ids);
        }
        let start = ids.first().map(|id| id.0);
        let result = if start.is_some() && start == self.failing_batch_start.get() {
            Err(PixelGridError::Ledger("multicall reverted".into()))
        } else {
            Ok(ids.into_iter().map(|id| self.lookup(id)).collect())
        };
        let yielding = self.yield_batches.get();
        async move {
            if yielding {
                YieldNow::default().await;
            }
            result
        }
        .boxed_local()
    }
}
