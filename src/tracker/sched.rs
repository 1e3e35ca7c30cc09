use std::sync::Arc;

use crate::store::CounterStore;

use super::IDLE_PID;

/// Attributes CPU time from scheduler context-switch events.
///
/// Time is credited only for completed run intervals: a switch-in records
/// the start timestamp, the matching switch-out consumes it and adds the
/// elapsed time. A switch-out with no recorded start still counts as a
/// context switch but attributes no time.
#[derive(Debug)]
pub struct SchedTracker {
    store: Arc<CounterStore>,
}

impl SchedTracker {
    pub fn new(store: Arc<CounterStore>) -> Self {
        Self { store }
    }

    /// Records that `pid` was scheduled onto a CPU at `ts`.
    pub fn switch_in(&self, pid: u32, ts: u64) {
        if pid == IDLE_PID {
            return;
        }
        if let Some(record) = self.store.get_or_create(pid) {
            record.mark_switched_in(ts);
        }
    }

    /// Records that `pid` was scheduled off of a CPU at `ts`.
    ///
    /// A regressing timestamp must not happen under a correct event source;
    /// if it does, the interval is absorbed as a zero delta and counted.
    pub fn switch_out(&self, pid: u32, ts: u64) {
        if pid == IDLE_PID {
            return;
        }
        let Some(record) = self.store.get_or_create(pid) else {
            return;
        };
        if record.mark_switched_out(ts) {
            self.store.note_clock_anomaly();
            log::warn!(
                target: "sched tracker",
                "switch-out timestamp regressed for pid={pid}, clamped to zero delta"
            );
        }
    }
}
