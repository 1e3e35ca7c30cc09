//! Event-driven trackers that translate kernel events into counter updates.
//!
//! Each tracker is a pure function of (event, counter store): trackers share
//! no state with one another except through the [`CounterStore`] they all
//! update.
//!
//! # Key Components
//!
//! - [`SchedTracker`] — attributes CPU time from context-switch pairs.
//! - [`LifecycleTracker`] — pre-registers forked processes, ignores exits.
//! - [`NetTracker`] — accumulates per-process packet and byte counters.
//! - [`Aggregator`] — fans incoming events out to the tracker responsible.

mod lifecycle;
mod net;
mod sched;

pub use lifecycle::LifecycleTracker;
pub use net::NetTracker;
pub use sched::SchedTracker;

use std::sync::Arc;

use crate::event::KernelEvent;
use crate::store::CounterStore;

/// The idle/kernel context. Its activity is not attributable to any user
/// process, so no tracker creates or updates a record for it.
pub(crate) const IDLE_PID: u32 = 0;

/// Dispatches kernel events to the tracker responsible for them.
///
/// `handle_event` takes `&self` and the type is `Sync`, so any number of
/// event source contexts may deliver events concurrently without external
/// synchronization.
#[derive(Debug)]
pub struct Aggregator {
    store: Arc<CounterStore>,
    sched: SchedTracker,
    lifecycle: LifecycleTracker,
    net: NetTracker,
}

impl Aggregator {
    pub fn new(store: Arc<CounterStore>) -> Self {
        Self {
            sched: SchedTracker::new(Arc::clone(&store)),
            lifecycle: LifecycleTracker::new(Arc::clone(&store)),
            net: NetTracker::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn handle_event(&self, event: &KernelEvent) {
        match *event {
            KernelEvent::SwitchOut { pid, ts } => self.sched.switch_out(pid, ts),
            KernelEvent::SwitchIn { pid, ts } => self.sched.switch_in(pid, ts),
            KernelEvent::ProcessCreated {
                parent_pid,
                child_pid,
            } => self.lifecycle.process_created(parent_pid, child_pid),
            KernelEvent::ProcessExited { pid } => self.lifecycle.process_exited(pid),
            KernelEvent::PacketReceived { pid, len } => self.net.packet_received(pid, len),
            KernelEvent::PacketTransmitted { pid, len } => self.net.packet_transmitted(pid, len),
            KernelEvent::SocketStateChanged { pid } => self.net.socket_state_changed(pid),
        }
    }

    pub fn store(&self) -> &CounterStore {
        &self.store
    }
}
