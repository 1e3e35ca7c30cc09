use std::sync::Arc;

use crate::store::CounterStore;

use super::IDLE_PID;

/// Accumulates per-process packet and byte counters from network events.
#[derive(Debug)]
pub struct NetTracker {
    store: Arc<CounterStore>,
}

impl NetTracker {
    pub fn new(store: Arc<CounterStore>) -> Self {
        Self { store }
    }

    /// Accounts one received packet of `len` bytes to `pid`.
    pub fn packet_received(&self, pid: u32, len: u32) {
        if pid == IDLE_PID {
            return;
        }
        if let Some(record) = self.store.get_or_create(pid) {
            record.add_received(len);
        }
    }

    /// Accounts one transmitted packet of `len` bytes to `pid`.
    pub fn packet_transmitted(&self, pid: u32, len: u32) {
        if pid == IDLE_PID {
            return;
        }
        if let Some(record) = self.store.get_or_create(pid) {
            record.add_transmitted(len);
        }
    }

    /// Ensures a record exists for `pid` without modifying any counters.
    ///
    /// Processes that open sockets but have not yet transferred anything
    /// still appear in enumeration this way.
    pub fn socket_state_changed(&self, pid: u32) {
        if pid == IDLE_PID {
            return;
        }
        let _ = self.store.get_or_create(pid);
    }
}
