//! Incremental batch loader.
//!
//! ```text
//! Idle -> FetchingTotal -> LoadingBatch(0) -> LoadingBatch(B) -> ... -> Complete
//!              |                 |
//!              +-----> Failed <--+          (cancel() from any loading phase -> Cancelled)
//! ```
//!
//! Batches are strictly sequential: at most one ledger request is in flight
//! per load. Per-record failures are logged and skipped; a failing bulk call
//! or total-count request ends the load in `Failed`. Everything runs on one
//! thread, so shared state lives in `Rc<RefCell<..>>` and no borrow is held
//! across an `.await`.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use super::cache::PixelCache;
use super::ledger::{Ledger, RecordDirectory, RecordId, RecordOutcome};
use crate::error::{PixelGridError, Result};
use crate::types::{CellCoord, CellRecord, GridConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    FetchingTotal,
    LoadingBatch {
        start: u64,
    },
    Complete,
    Failed,
    Cancelled,
}

impl LoadPhase {
    pub fn is_loading(self) -> bool {
        matches!(self, Self::FetchingTotal | Self::LoadingBatch { .. })
    }
}

/// Everything the loader knows about the ledger so far.
#[derive(Debug, Default)]
pub struct SyncState {
    phase: LoadPhase,
    total: Option<u64>,
    progress: u8,
    cache: PixelCache,
    directory: RecordDirectory,
    skipped: u64,
    last_error: Option<PixelGridError>,
}

impl SyncState {
    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// Total record count reported by the ledger, once known.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Load progress in percent, `0..=100`.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn cache(&self) -> &PixelCache {
        &self.cache
    }

    pub fn directory(&self) -> &RecordDirectory {
        &self.directory
    }

    /// Records that failed to fetch or decode.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn last_error(&self) -> Option<&PixelGridError> {
        self.last_error.as_ref()
    }
}

/// `floor(min(end, total) / total * 100)`, 100 for an empty ledger.
pub fn progress_for(end: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = u128::from(end.min(total)) * 100 / u128::from(total);
    u8::try_from(pct).unwrap_or(100)
}

type Listener = Box<dyn Fn()>;

/// Handle to one sync lifetime: the cache, load status and `refresh`.
///
/// Cloning the handle shares the same state.
pub struct SyncHandle<L: Ledger> {
    ledger: Rc<L>,
    config: Rc<GridConfig>,
    state: Rc<RefCell<SyncState>>,
    cancelled: Rc<Cell<bool>>,
    listener: Rc<RefCell<Option<Listener>>>,
}

impl<L: Ledger> Clone for SyncHandle<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Rc::clone(&self.ledger),
            config: Rc::clone(&self.config),
            state: Rc::clone(&self.state),
            cancelled: Rc::clone(&self.cancelled),
            listener: Rc::clone(&self.listener),
        }
    }
}

impl<L: Ledger> SyncHandle<L> {
    pub fn new(ledger: Rc<L>, config: GridConfig) -> Self {
        Self {
            ledger,
            config: Rc::new(config),
            state: Rc::new(RefCell::new(SyncState::default())),
            cancelled: Rc::new(Cell::new(false)),
            listener: Rc::new(RefCell::new(None)),
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Borrow the current state. Do not hold the borrow across an `.await`.
    pub fn state(&self) -> Ref<'_, SyncState> {
        self.state.borrow()
    }

    pub fn phase(&self) -> LoadPhase {
        self.state.borrow().phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase().is_loading()
    }

    pub fn progress(&self) -> u8 {
        self.state.borrow().progress
    }

    /// Called after every state change (phase, progress or cache).
    pub fn set_listener(&self, listener: impl Fn() + 'static) {
        *self.listener.borrow_mut() = Some(Box::new(listener));
    }

    /// Stop loading; results that arrive later are ignored.
    pub fn cancel(&self) {
        self.cancelled.set(true);
        let was_loading = {
            let mut s = self.state.borrow_mut();
            let was_loading = s.phase.is_loading();
            if was_loading {
                s.phase = LoadPhase::Cancelled;
            }
            was_loading
        };
        if was_loading {
            log::info!("sync cancelled");
            self.notify();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    fn notify(&self) {
        if let Some(listener) = self.listener.borrow().as_ref() {
            listener();
        }
    }

    fn set_phase(&self, phase: LoadPhase) {
        self.state.borrow_mut().phase = phase;
        self.notify();
    }

    fn fail(&self, error: PixelGridError) -> LoadPhase {
        log::error!("sync stopped: {error}");
        {
            let mut s = self.state.borrow_mut();
            s.phase = LoadPhase::Failed;
            s.last_error = Some(error);
        }
        self.notify();
        LoadPhase::Failed
    }

    /// Run the initial load to completion. Returns the terminal phase.
    ///
    /// A handle loads once; calling this again after the load started just
    /// returns the current phase.
    pub async fn load(&self) -> LoadPhase {
        let phase = self.phase();
        if phase != LoadPhase::Idle {
            log::debug!("load already started ({phase:?})");
            return phase;
        }
        if self.is_cancelled() {
            self.set_phase(LoadPhase::Cancelled);
            return LoadPhase::Cancelled;
        }

        self.set_phase(LoadPhase::FetchingTotal);
        let total = match self.fetch_total().await {
            Ok(total) => total,
            Err(e) => {
                if self.is_cancelled() {
                    return LoadPhase::Cancelled;
                }
                return self.fail(e);
            }
        };
        if self.is_cancelled() {
            return LoadPhase::Cancelled;
        }
        {
            let mut s = self.state.borrow_mut();
            s.total = Some(total);
            s.directory.set_known_total(total);
        }
        log::info!("ledger holds {total} records");

        let batch_size = u64::from(self.config.batch_size.max(1));
        let mut start = 0;
        while start < total {
            if self.is_cancelled() {
                return LoadPhase::Cancelled;
            }
            let end = start.saturating_add(batch_size).min(total);
            self.set_phase(LoadPhase::LoadingBatch { start });

            let ids = self.state.borrow().directory.ids_for_range(start..end);
            let outcomes = match self.ledger.records(ids.clone()).await {
                Ok(outcomes) => outcomes,
                Err(e) => {
                    if self.is_cancelled() {
                        return LoadPhase::Cancelled;
                    }
                    return self.fail(e);
                }
            };
            if self.is_cancelled() {
                log::debug!("dropping batch [{start}, {end}) after cancel");
                return LoadPhase::Cancelled;
            }

            let (loaded, skipped) = self.merge_outcomes(&ids, outcomes);
            {
                let mut s = self.state.borrow_mut();
                s.progress = s.progress.max(progress_for(end, total));
            }
            log::debug!(
                "batch [{start}, {end}) merged: {loaded} loaded, {skipped} skipped, {}%",
                self.progress()
            );
            self.notify();
            start = end;
        }

        {
            let mut s = self.state.borrow_mut();
            s.progress = 100;
            s.phase = LoadPhase::Complete;
        }
        log::info!(
            "sync complete: {} cells, {} skipped",
            self.state.borrow().cache.len(),
            self.state.borrow().skipped
        );
        self.notify();
        LoadPhase::Complete
    }

    async fn fetch_total(&self) -> Result<u64> {
        let attempts = self.config.total_count_retries.saturating_add(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            match self.ledger.total_count().await {
                Ok(total) => return Ok(total),
                Err(e) => {
                    log::warn!("total count attempt {attempt}/{attempts} failed: {e}");
                    last_error = Some(e);
                }
            }
            if self.is_cancelled() {
                break;
            }
        }
        Err(last_error
            .unwrap_or_else(|| PixelGridError::Ledger("total count unavailable".to_string())))
    }

    /// Decode and merge one batch. Returns `(loaded, skipped)`.
    fn merge_outcomes(&self, ids: &[RecordId], outcomes: Vec<RecordOutcome>) -> (usize, u64) {
        let mut skipped: u64 = 0;
        if outcomes.len() != ids.len() {
            log::warn!(
                "ledger returned {} outcomes for {} ids",
                outcomes.len(),
                ids.len()
            );
            skipped += ids.len().saturating_sub(outcomes.len()) as u64;
        }

        let mut decoded = Vec::with_capacity(outcomes.len());
        for (id, outcome) in ids.iter().zip(outcomes) {
            match outcome.and_then(|raw| raw.decode(&self.config)) {
                Ok(record) => decoded.push((*id, record)),
                Err(e) => {
                    log::warn!("skipping record {}: {e}", id.0);
                    skipped += 1;
                }
            }
        }

        let mut s = self.state.borrow_mut();
        for (id, record) in &decoded {
            s.directory.remember(record.coord(), *id);
        }
        let loaded = s.cache.merge(decoded.into_iter().map(|(_, record)| record));
        s.skipped += skipped;
        (loaded, skipped)
    }

    /// Re-read the record at `coord` after an external write was confirmed.
    ///
    /// Known cells are re-fetched by id and replace their cache entry. A cell
    /// the loader has never seen is a fresh mint: the new tail of the ledger
    /// is loaded instead. Safe to run while the initial load is in flight.
    pub async fn refresh(&self, coord: CellCoord) -> Result<Option<CellRecord>> {
        if self.is_cancelled() {
            return Ok(None);
        }
        let resolved = self.state.borrow().directory.resolve(coord);
        let Some(id) = resolved else {
            self.load_tail().await?;
            let record = self.state.borrow().cache.get(coord).cloned();
            return Ok(record);
        };

        let raw = self.ledger.record(id).await?;
        if self.is_cancelled() {
            return Ok(None);
        }
        let record = raw.decode(&self.config)?;
        if record.coord() != coord {
            log::warn!(
                "record {} now at ({}, {}), expected ({}, {})",
                id.0,
                record.x,
                record.y,
                coord.x,
                coord.y
            );
        }
        {
            let mut s = self.state.borrow_mut();
            s.directory.remember(record.coord(), id);
            s.cache.upsert(record.clone());
        }
        log::debug!("refreshed ({}, {})", record.x, record.y);
        self.notify();
        Ok(Some(record))
    }

    /// Load records appended after the last known total.
    async fn load_tail(&self) -> Result<()> {
        let known = self.state.borrow().directory.known_total();
        let Some(known) = known else {
            log::debug!("total not known yet; new cells arrive with the initial load");
            return Ok(());
        };
        let total = self.ledger.total_count().await?;
        let batch_size = u64::from(self.config.batch_size.max(1));
        let mut start = known;
        while start < total {
            if self.is_cancelled() {
                return Ok(());
            }
            let end = start.saturating_add(batch_size).min(total);
            let ids = self.state.borrow().directory.ids_for_range(start..end);
            let outcomes = self.ledger.records(ids.clone()).await?;
            if self.is_cancelled() {
                return Ok(());
            }
            self.merge_outcomes(&ids, outcomes);
            {
                let mut s = self.state.borrow_mut();
                s.directory.set_known_total(end);
                s.total = Some(s.total.map_or(end, |t| t.max(end)));
            }
            start = end;
        }
        if total > known {
            log::debug!("loaded {} new records", total - known);
            self.notify();
        }
        Ok(())
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
    use crate::sync::memory::MemoryLedger;
    use crate::sync::ledger::RawRecord;
    use crate::types::Rgba;
    use futures::executor::block_on;
    use test_case::test_case;

    #[test_case(0, 0 => 100)]
    #[test_case(5, 10 => 50)]
    #[test_case(1, 3 => 33)]
    #[test_case(15, 10 => 100)]
    fn progress_is_floored(end: u64, total: u64) -> u8 {
        progress_for(end, total)
    }

    fn raw(x: u16, y: u16) -> RawRecord {
        RawRecord::from_cell(&CellRecord::new(
            CellCoord::new(x, y),
            Rgba::opaque(9, 9, 9),
            "",
            None,
        ))
    }

    #[test]
    fn listener_sees_every_batch() {
        let ledger = Rc::new(MemoryLedger::new((0..7).map(|i| raw(i, 0)).collect()));
        let config = GridConfig {
            batch_size: 3,
            ..GridConfig::default()
        };
        let sync = SyncHandle::new(ledger, config);
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = Rc::clone(&seen);
            let observer = sync.clone();
            sync.set_listener(move || seen.borrow_mut().push(observer.progress()));
        }
        assert_eq!(block_on(sync.load()), LoadPhase::Complete);
        let seen = seen.borrow();
        assert!(seen.contains(&42));
        assert!(seen.contains(&85));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn second_load_is_a_no_op() {
        let ledger = Rc::new(MemoryLedger::new(vec![raw(1, 1)]));
        let sync = SyncHandle::new(ledger, GridConfig::default());
        assert_eq!(block_on(sync.load()), LoadPhase::Complete);
        assert_eq!(block_on(sync.load()), LoadPhase::Complete);
        assert_eq!(sync.state().cache().len(), 1);
    }

    #[test]
    fn cancel_before_load_never_fetches() {
        let ledger = Rc::new(MemoryLedger::new(vec![raw(1, 1)]));
        let sync = SyncHandle::new(ledger, GridConfig::default());
        sync.cancel();
        assert_eq!(block_on(sync.load()), LoadPhase::Cancelled);
        assert!(sync.state().cache().is_empty());
        assert!(!sync.is_loading());
    }
}
