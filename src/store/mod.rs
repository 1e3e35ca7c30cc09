//! The shared counter store: a concurrent map from process identifier to
//! cumulative usage counters.
//!
//! Events arrive from multiple execution contexts (conceptually one per CPU
//! core) with no serialization between them, so the store never takes a
//! whole-map lock for a single event: lookups contend only on a map shard
//! and every counter field is an independent atomic.
//!
//! # Key Components
//!
//! - [`CounterStore`] — keyed map with atomic get-or-create and snapshot
//!   reads for the consumer.
//! - [`CounterRecord`] — the per-process atomics, mutated by the trackers.
//! - [`CounterSnapshot`] — the plain-data copy handed to consumers.
//!
//! Records are never deleted by the trackers; [`CounterStore::remove`] exists
//! for the consumer, which decides when final statistics have been read.

mod record;

pub use record::{CounterRecord, CounterSnapshot};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// Concurrent keyed store of per-process usage counters.
#[derive(Debug, Default)]
pub struct CounterStore {
    records: DashMap<u32, Arc<CounterRecord>>,
    max_tracked: Option<usize>,
    clock_anomalies: AtomicU64,
    rejected_creations: AtomicU64,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that refuses to track more than `max_tracked`
    /// processes at once.
    ///
    /// The cap bounds memory for the accumulate-forever model; it is
    /// approximate under concurrent creation and may briefly overshoot by
    /// the number of racing contexts.
    pub fn with_limit(max_tracked: Option<usize>) -> Self {
        Self {
            max_tracked,
            ..Self::default()
        }
    }

    /// Returns a handle to the record for `pid`, creating a zero-valued one
    /// if absent.
    ///
    /// Concurrent callers racing on the same unseen `pid` observe a single
    /// record; an already-initialized record is never replaced with zeros.
    /// Returns `None` only when `pid` is untracked and the store is at
    /// capacity, in which case the rejection is counted.
    pub fn get_or_create(&self, pid: u32) -> Option<Arc<CounterRecord>> {
        if let Some(existing) = self.records.get(&pid) {
            return Some(Arc::clone(existing.value()));
        }
        if self.at_capacity() {
            self.rejected_creations.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        Some(Arc::clone(self.records.entry(pid).or_default().value()))
    }

    /// Zeroes the record for `pid`, creating it if absent.
    ///
    /// Process identifiers are recycled by the operating system; a fork of a
    /// recycled identifier must not inherit the previous process's counters.
    pub fn reset_or_create(&self, pid: u32) {
        if !self.records.contains_key(&pid) && self.at_capacity() {
            self.rejected_creations.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.records
            .entry(pid)
            .and_modify(|record| record.reset())
            .or_default();
    }

    /// Returns a point-in-time copy of the record for `pid`, if tracked.
    pub fn get(&self, pid: u32) -> Option<CounterSnapshot> {
        self.records.get(&pid).map(|record| record.snapshot())
    }

    /// Copies a point-in-time snapshot of every record into `out`.
    ///
    /// Only per-shard read locks are held while copying, so tracker updates
    /// proceed on other shards, and the returned copies never change under
    /// the consumer.
    pub fn snapshot_into(&self, out: &mut Vec<(u32, CounterSnapshot)>) {
        for entry in self.records.iter() {
            out.push((*entry.key(), entry.value().snapshot()));
        }
    }

    /// Convenience wrapper around [`CounterStore::snapshot_into`].
    pub fn snapshot(&self) -> Vec<(u32, CounterSnapshot)> {
        let mut out = Vec::with_capacity(self.records.len());
        self.snapshot_into(&mut out);
        out
    }

    /// Removes the record for `pid`.
    ///
    /// Consumer-only: no tracker calls this, so final counters of exited
    /// processes stay readable until the consumer decides otherwise.
    pub fn remove(&self, pid: u32) {
        self.records.remove(&pid);
    }

    /// Number of currently tracked processes.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of switch-out timestamps that regressed and were clamped to a
    /// zero delta.
    pub fn clock_anomalies(&self) -> u64 {
        self.clock_anomalies.load(Ordering::Relaxed)
    }

    pub(crate) fn note_clock_anomaly(&self) {
        self.clock_anomalies.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of record creations refused because the store was at capacity.
    pub fn rejected_creations(&self) -> u64 {
        self.rejected_creations.load(Ordering::Relaxed)
    }

    fn at_capacity(&self) -> bool {
        self.max_tracked
            .is_some_and(|max| self.records.len() >= max)
    }
}
