//! Scheduler Backend Abstraction
//!
//! # Design Philosophy
//!
//! The simulator never looks inside its event set. Everything it needs is
//! expressed by [`SchedulerBackend`], an ordered multiset of
//! [`ScheduledEvent`]s keyed by [`EventKey`]. The four implementations differ
//! only in cost profile:
//!
//! ```text
//! ┌───────────┬──────────┬────────────┬──────────────┐
//! │ backend   │ insert   │ remove_next│ remove(key)  │
//! ├───────────┼──────────┼────────────┼──────────────┤
//! │ heap      │ O(log n) │ O(log n)   │ O(n)         │
//! │ list      │ O(n)     │ O(1)       │ O(n)         │
//! │ map       │ O(log n) │ O(log n)   │ O(log n)     │
//! │ calendar  │ O(1)*    │ O(1)*      │ O(n / b)*    │
//! └───────────┴──────────┴────────────┴──────────────┘
//!                                    * amortized, uniform spread
//! ```
//!
//! The trait is object safe: the simulator holds a `Box<dyn SchedulerBackend>`
//! so the backend can be chosen from configuration and swapped mid-run.
//!
//! # Contract
//!
//! 1. **Order**: `peek_next`/`remove_next` always yield the smallest key.
//! 2. **Uniqueness**: keys are unique (the uid is); inserting a duplicate is
//!    a caller bug.
//! 3. **Exact removal**: `remove(key)` matches timestamp and uid.
//! 4. **Emptiness**: `is_empty() ⇔ len() == 0`.
//!
//! Missing entries are reported as `None` here; the simulator decides which
//! of those are fatal.

use crate::domain::event::{EventKey, ScheduledEvent};

/// Ordered event set used by the simulator
pub trait SchedulerBackend {
    /// Add an entry
    fn insert(&mut self, event: ScheduledEvent);

    /// Entry with the smallest key, without removing it
    fn peek_next(&self) -> Option<&ScheduledEvent>;

    /// Remove and return the entry with the smallest key
    fn remove_next(&mut self) -> Option<ScheduledEvent>;

    /// Remove the entry with exactly this key
    fn remove(&mut self, key: &EventKey) -> Option<ScheduledEvent>;

    /// Number of entries
    fn len(&self) -> usize;

    /// Short backend name (`"heap"`, `"list"`, ...)
    fn name(&self) -> &'static str;

    /// `true` when no entry is stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry, in key order
    fn drain(&mut self) -> Vec<ScheduledEvent> {
        let mut drained = Vec::with_capacity(self.len());
        while let Some(event) = self.remove_next() {
            drained.push(event);
        }
        drained
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::domain::event::{EventImpl, NO_CONTEXT};
    use crate::domain::simulator::Simulator;
    use crate::domain::time::Time;

    pub(crate) fn entry(ms: i64, uid: u64) -> ScheduledEvent {
        let event = EventImpl::new(NO_CONTEXT, Box::new(|_: &mut Simulator| {}));
        ScheduledEvent::new(EventKey::new(Time::from_millis(ms), uid), Rc::new(event))
    }

    fn pop_uids(backend: &mut dyn SchedulerBackend) -> Vec<u64> {
        std::iter::from_fn(|| backend.remove_next().map(|e| e.key.uid)).collect()
    }

    /// Contract every backend must satisfy; called from each backend's tests
    pub(crate) fn check_backend_contract(backend: &mut dyn SchedulerBackend) {
        assert!(backend.is_empty());
        assert!(backend.peek_next().is_none());
        assert!(backend.remove_next().is_none());

        // Same-time entries keep uid order, earlier times first
        for (ms, uid) in [(5, 0), (3, 1), (5, 2), (1, 3), (3, 4), (9, 5)] {
            backend.insert(entry(ms, uid));
        }
        assert_eq!(backend.len(), 6);
        assert_eq!(backend.peek_next().map(|e| e.key.uid), Some(3));
        assert_eq!(pop_uids(backend), vec![3, 1, 4, 0, 2, 5]);
        assert!(backend.is_empty());

        // Exact removal, including the current minimum and the maximum
        for (ms, uid) in [(2, 10), (2, 11), (4, 12), (8, 13), (6, 14)] {
            backend.insert(entry(ms, uid));
        }
        let min = EventKey::new(Time::from_millis(2), 10);
        assert_eq!(backend.remove(&min).map(|e| e.key), Some(min));
        let max = EventKey::new(Time::from_millis(8), 13);
        assert_eq!(backend.remove(&max).map(|e| e.key), Some(max));
        // right uid, wrong timestamp
        assert!(backend.remove(&EventKey::new(Time::from_millis(3), 12)).is_none());
        assert!(backend.remove(&min).is_none());
        assert_eq!(backend.len(), 3);
        assert_eq!(backend.peek_next().map(|e| e.key.uid), Some(11));

        // Interleaved insert/pop keeps order
        backend.insert(entry(1, 15));
        assert_eq!(backend.remove_next().map(|e| e.key.uid), Some(15));
        backend.insert(entry(5, 16));
        let drained: Vec<u64> = backend.drain().iter().map(|e| e.key.uid).collect();
        assert_eq!(drained, vec![11, 12, 16, 14]);
        assert!(backend.is_empty());
        assert_eq!(backend.len(), 0);
    }
}
