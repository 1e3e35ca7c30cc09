use std::sync::Arc;

use crate::store::CounterStore;

use super::IDLE_PID;

/// Pre-registers forked processes and deliberately ignores exits.
///
/// Exit events do not touch the store: final counters stay readable until
/// the consumer purges them, so even short-lived processes remain
/// inspectable post-mortem.
#[derive(Debug)]
pub struct LifecycleTracker {
    store: Arc<CounterStore>,
}

impl LifecycleTracker {
    pub fn new(store: Arc<CounterStore>) -> Self {
        Self { store }
    }

    /// Registers a freshly forked child with zeroed counters.
    ///
    /// A preexisting record for `child_pid` is reset: the operating system
    /// recycles identifiers, and a fork proves the old owner is gone.
    pub fn process_created(&self, parent_pid: u32, child_pid: u32) {
        if child_pid == IDLE_PID {
            return;
        }
        self.store.reset_or_create(child_pid);
        log::trace!(
            target: "lifecycle tracker",
            "registered pid={child_pid} (parent={parent_pid})"
        );
    }

    /// No-op: removal is the consumer's call, after final stats are read.
    pub fn process_exited(&self, _pid: u32) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CounterSnapshot;

    fn tracker() -> (Arc<CounterStore>, LifecycleTracker) {
        let store = Arc::new(CounterStore::new());
        (Arc::clone(&store), LifecycleTracker::new(store))
    }

    #[test]
    fn test_fork_registers_zeroed_child() {
        let (store, lifecycle) = tracker();
        lifecycle.process_created(1, 42);
        assert_eq!(store.get(42), Some(CounterSnapshot::default()));
    }

    #[test]
    fn test_fork_resets_recycled_pid() {
        let (store, lifecycle) = tracker();
        store.get_or_create(42).unwrap().add_received(100);

        lifecycle.process_created(1, 42);
        assert_eq!(store.get(42), Some(CounterSnapshot::default()));
    }

    #[test]
    fn test_exit_leaves_counters_untouched() {
        let (store, lifecycle) = tracker();
        store.get_or_create(42).unwrap().add_transmitted(64);

        lifecycle.process_exited(42);
        let snap = store.get(42).unwrap();
        assert_eq!(snap.packet_count, 1);
        assert_eq!(snap.bytes_sent, 64);
    }

    #[test]
    fn test_idle_child_not_registered() {
        let (store, lifecycle) = tracker();
        lifecycle.process_created(1, 0);
        assert!(store.is_empty());
    }
}
