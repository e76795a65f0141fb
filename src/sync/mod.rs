//! Incremental synchronization of the local cell cache with the ledger.
//!
//! - `ledger`: read interface, raw records and the record-id resolver
//! - `cache`: keyed cell cache
//! - `loader`: batched initial load, progress and `refresh`
//! - `memory`: in-memory ledger for the CLI and tests

pub mod cache;
pub mod ledger;
pub mod loader;
pub mod memory;

pub use cache::PixelCache;
pub use ledger::{Ledger, RawRecord, RecordDirectory, RecordId, RecordOutcome};
pub use loader::{progress_for, LoadPhase, SyncHandle, SyncState};
pub use memory::MemoryLedger;
