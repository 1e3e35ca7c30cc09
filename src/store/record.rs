use std::sync::atomic::{AtomicU64, Ordering};

/// Marker value meaning "not currently on a CPU" in `last_switch_in_ts`.
/// `u64::MAX` is reserved; a monotonic nanosecond timestamp never reaches it.
const NOT_RUNNING: u64 = u64::MAX;

/// Cumulative usage counters for a single process.
///
/// Every field is an independent atomic so trackers running on different
/// execution contexts may update different fields of the same record without
/// coordination. No counter ever decreases.
#[derive(Debug)]
pub struct CounterRecord {
    cpu_time_ns: AtomicU64,
    last_switch_in_ts: AtomicU64,
    context_switch_count: AtomicU64,
    packet_count: AtomicU64,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
}

impl Default for CounterRecord {
    fn default() -> Self {
        Self {
            cpu_time_ns: AtomicU64::new(0),
            last_switch_in_ts: AtomicU64::new(NOT_RUNNING),
            context_switch_count: AtomicU64::new(0),
            packet_count: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
        }
    }
}

impl CounterRecord {
    /// Marks the process as scheduled onto a CPU at `ts`, overwriting any
    /// stale start timestamp.
    pub fn mark_switched_in(&self, ts: u64) {
        // NOT_RUNNING is reserved as the absent marker.
        self.last_switch_in_ts
            .store(ts.min(NOT_RUNNING - 1), Ordering::Release);
    }

    /// Marks the process as scheduled off of a CPU at `ts`.
    ///
    /// The start timestamp is consumed by a single atomic swap, so each run
    /// interval is attributed exactly once; a spurious repeated switch-out
    /// adds nothing. The context switch count is incremented whether or not
    /// a start timestamp was present.
    ///
    /// Returns `true` if `ts` regressed below the recorded start timestamp;
    /// the delta is clamped to zero in that case instead of underflowing.
    pub fn mark_switched_out(&self, ts: u64) -> bool {
        let started = self.last_switch_in_ts.swap(NOT_RUNNING, Ordering::AcqRel);
        let mut regressed = false;
        if started != NOT_RUNNING {
            regressed = ts < started;
            self.cpu_time_ns
                .fetch_add(ts.saturating_sub(started), Ordering::Relaxed);
        }
        self.context_switch_count.fetch_add(1, Ordering::Relaxed);
        regressed
    }

    /// Accounts one received packet of `len` bytes.
    pub fn add_received(&self, len: u32) {
        self.packet_count.fetch_add(1, Ordering::Relaxed);
        self.bytes_received
            .fetch_add(u64::from(len), Ordering::Relaxed);
    }

    /// Accounts one transmitted packet of `len` bytes.
    pub fn add_transmitted(&self, len: u32) {
        self.packet_count.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(u64::from(len), Ordering::Relaxed);
    }

    /// Zeroes all counters.
    ///
    /// Used when a recycled process identifier is forked again; increments
    /// racing with the reset may land after it and count toward the new
    /// process, which matches how the identifier is being reused.
    pub fn reset(&self) {
        self.cpu_time_ns.store(0, Ordering::Relaxed);
        self.last_switch_in_ts.store(NOT_RUNNING, Ordering::Relaxed);
        self.context_switch_count.store(0, Ordering::Relaxed);
        self.packet_count.store(0, Ordering::Relaxed);
        self.bytes_sent.store(0, Ordering::Relaxed);
        self.bytes_received.store(0, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of the counters.
    pub fn snapshot(&self) -> CounterSnapshot {
        let last = self.last_switch_in_ts.load(Ordering::Acquire);
        CounterSnapshot {
            cpu_time_ns: self.cpu_time_ns.load(Ordering::Relaxed),
            last_switch_in_ts: (last != NOT_RUNNING).then_some(last),
            context_switch_count: self.context_switch_count.load(Ordering::Relaxed),
            packet_count: self.packet_count.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
        }
    }
}

/// Plain-data copy of a [`CounterRecord`] as handed to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct CounterSnapshot {
    /// Cumulative CPU time attributed to the process, in nanoseconds.
    pub cpu_time_ns: u64,
    /// Timestamp of the last switch-in, if the process was on a CPU when the
    /// snapshot was taken.
    pub last_switch_in_ts: Option<u64>,
    /// Times the process was switched off of a CPU.
    pub context_switch_count: u64,
    /// Packets received plus packets transmitted.
    pub packet_count: u64,
    /// Bytes transmitted.
    pub bytes_sent: u64,
    /// Bytes received.
    pub bytes_received: u64,
}
