use serde::Serialize;
use std::cell::Cell;

/// Snapshot of a store's operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreMetrics {
    /// Records inserted.
    pub inserts: u64,
    /// Successful in-place updates.
    pub updates: u64,
    /// Records deleted.
    pub deletes: u64,
    /// Inserts that landed in a recycled slot.
    pub slots_reused: u64,
    /// Exact-match index lookups.
    pub exact_lookups: u64,
    /// Range scans served.
    pub range_scans: u64,
    /// Index hits that pointed at a tombstone and were dropped.
    pub tombstones_skipped: u64,
}

impl StoreMetrics {
    /// Fraction of inserts served from the free list, `0.0` before any insert.
    pub fn reuse_rate(&self) -> f64 {
        if self.inserts == 0 {
            0.0
        } else {
            self.slots_reused as f64 / self.inserts as f64
        }
    }
}

/// Live counters. Read paths take `&self`, so they count through `Cell`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Counters {
    inserts: Cell<u64>,
    updates: Cell<u64>,
    deletes: Cell<u64>,
    slots_reused: Cell<u64>,
    exact_lookups: Cell<u64>,
    range_scans: Cell<u64>,
    tombstones_skipped: Cell<u64>,
}

fn bump(counter: &Cell<u64>, by: u64) {
    counter.set(counter.get().saturating_add(by));
}

impl Counters {
    pub(crate) fn record_insert(&self, reused: bool) {
        bump(&self.inserts, 1);
        if reused {
            bump(&self.slots_reused, 1);
        }
    }

    pub(crate) fn record_update(&self) {
        bump(&self.updates, 1);
    }

    pub(crate) fn record_delete(&self) {
        bump(&self.deletes, 1);
    }

    pub(crate) fn record_lookup(&self) {
        bump(&self.exact_lookups, 1);
    }

    pub(crate) fn record_range_scan(&self) {
        bump(&self.range_scans, 1);
    }

    pub(crate) fn record_tombstones_skipped(&self, count: u64) {
        bump(&self.tombstones_skipped, count);
    }

    pub(crate) fn snapshot(&self) -> StoreMetrics {
        StoreMetrics {
            inserts: self.inserts.get(),
            updates: self.updates.get(),
            deletes: self.deletes.get(),
            slots_reused: self.slots_reused.get(),
            exact_lookups: self.exact_lookups.get(),
            range_scans: self.range_scans.get(),
            tombstones_skipped: self.tombstones_skipped.get(),
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
