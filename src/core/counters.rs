//! # Run counters and result snapshots.
//!
//! [`RunCounters`] is the only state mutated from several tasks during a run:
//! workers record unit outcomes, flush tasks record flush failures, the
//! orchestrator numbers batches. Every mutation is a single atomic operation.
//!
//! Reads are consistent only at the join points: after a chunk barrier and
//! after the final drain. [`RunResult`] is the immutable snapshot handed to
//! callers and observers.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Final (or drained) counters of one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunResult {
    /// Units submitted for processing.
    pub attempted: u64,
    /// Units that completed without error.
    pub succeeded: u64,
    /// Units that returned an error or panicked.
    pub failed: u64,
    /// Items collected by successful units (1 per plain unit, `item_count` per page).
    pub items: u64,
    /// Total number of units, if known up front (`None` = unknown, distinct from `Some(0)`).
    pub total: Option<u64>,
    /// Total number of pages (page variants only).
    pub total_pages: Option<u64>,
    /// Total number of items reported by the first page (bootstrap variant only).
    pub total_items: Option<u64>,
    /// Flushes scheduled.
    pub batches: u64,
    /// Flushes that returned an error or panicked.
    pub flush_failures: u64,
    /// True if the run stopped because shutdown was requested.
    pub stopped_by_shutdown: bool,
}

impl RunResult {
    /// True if no unit and no flush failed.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.flush_failures == 0
    }
}

/// Transient record of one finished chunk, handed to its flush.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkResult {
    /// 1-based chunk number within the run.
    pub batch: u64,
    /// Units of this chunk that were processed.
    pub attempted: usize,
    /// Units of this chunk that succeeded.
    pub succeeded: usize,
    /// Items collected by the whole run when this flush was scheduled.
    pub items_total: u64,
}

/// What the run's `total` counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TotalKind {
    Units,
    Pages,
}

/// Shared, monotonically updated counters of one run.
#[derive(Debug, Default)]
pub(crate) struct RunCounters {
    attempted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    items: AtomicU64,
    batches: AtomicU64,
    flush_failures: AtomicU64,
    stopped_by_shutdown: AtomicBool,
    total: OnceLock<u64>,
    total_pages: OnceLock<u64>,
    total_items: OnceLock<u64>,
}

impl RunCounters {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers one submitted unit and returns its 1-based ordinal.
    pub(crate) fn begin_unit(&self) -> u64 {
        self.attempted.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn record_success(&self, items: u64) {
        self.succeeded.fetch_add(1, Ordering::AcqRel);
        self.items.fetch_add(items, Ordering::AcqRel);
    }

    pub(crate) fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::AcqRel);
    }

    /// Allocates the next 1-based batch number.
    pub(crate) fn next_batch(&self) -> u64 {
        self.batches.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn batches(&self) -> u64 {
        self.batches.load(Ordering::Acquire)
    }

    pub(crate) fn record_flush_failure(&self) {
        self.flush_failures.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn mark_shutdown(&self) {
        self.stopped_by_shutdown.store(true, Ordering::Release);
    }

    pub(crate) fn items(&self) -> u64 {
        self.items.load(Ordering::Acquire)
    }

    /// Sets the known total once; later calls are ignored.
    pub(crate) fn set_total(&self, total: Option<u64>, kind: TotalKind) {
        let Some(total) = total else { return };
        let _ = self.total.set(total);
        if kind == TotalKind::Pages {
            let _ = self.total_pages.set(total);
        }
    }

    pub(crate) fn set_total_items(&self, total_items: u64) {
        let _ = self.total_items.set(total_items);
    }

    pub(crate) fn snapshot(&self) -> RunResult {
        RunResult {
            attempted: self.attempted.load(Ordering::Acquire),
            succeeded: self.succeeded.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            items: self.items.load(Ordering::Acquire),
            total: self.total.get().copied(),
            total_pages: self.total_pages.get().copied(),
            total_items: self.total_items.get().copied(),
            batches: self.batches.load(Ordering::Acquire),
            flush_failures: self.flush_failures.load(Ordering::Acquire),
            stopped_by_shutdown: self.stopped_by_shutdown.load(Ordering::Acquire),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_ordinals_and_batches_are_one_based() {
        let c = RunCounters::new();
        assert_eq!(c.begin_unit(), 1);
        assert_eq!(c.begin_unit(), 2);
        assert_eq!(c.next_batch(), 1);
        assert_eq!(c.next_batch(), 2);
    }

    #[test]
    fn test_total_unknown_is_distinct_from_zero() {
        let unknown = RunCounters::new();
        unknown.set_total(None, TotalKind::Units);
        assert_eq!(unknown.snapshot().total, None);

        let zero = RunCounters::new();
        zero.set_total(Some(0), TotalKind::Units);
        assert_eq!(zero.snapshot().total, Some(0));
        assert_eq!(zero.snapshot().total_pages, None);
    }

    #[test]
    fn test_total_is_set_once() {
        let c = RunCounters::new();
        c.set_total(Some(7), TotalKind::Pages);
        c.set_total(Some(9), TotalKind::Pages);
        let snap = c.snapshot();
        assert_eq!(snap.total, Some(7));
        assert_eq!(snap.total_pages, Some(7));
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let c = Arc::new(RunCounters::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || {
                    for i in 0..1000 {
                        c.begin_unit();
                        if (i + t) % 4 == 0 {
                            c.record_failure();
                        } else {
                            c.record_success(2);
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snap = c.snapshot();
        assert_eq!(snap.attempted, 8000);
        assert_eq!(snap.succeeded + snap.failed, 8000);
        assert_eq!(snap.failed, 2000);
        assert_eq!(snap.items, snap.succeeded * 2);
        assert!(!snap.is_clean());
    }
}
