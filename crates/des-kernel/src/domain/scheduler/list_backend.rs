//! Sorted List Backend
//!
//! Entries are kept in ascending key order in a `VecDeque`, so the earliest
//! event is always at the front. Insertion scans from the front for the first
//! entry with a greater key; equal timestamps are ordered by uid, which the
//! key comparison already covers.
//!
//! O(n) insert, O(1) pop. Useful as a reference oracle for the other backends
//! and for small, short-horizon workloads.

use std::collections::VecDeque;

use crate::domain::event::{EventKey, ScheduledEvent};

use super::backend::SchedulerBackend;

/// Ordered sequence of events
#[derive(Debug, Default)]
pub struct ListScheduler {
    entries: VecDeque<ScheduledEvent>,
}

impl ListScheduler {
    /// Empty list
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchedulerBackend for ListScheduler {
    fn insert(&mut self, event: ScheduledEvent) {
        let at = self
            .entries
            .iter()
            .position(|e| event.key < e.key)
            .unwrap_or(self.entries.len());
        self.entries.insert(at, event);
    }

    fn peek_next(&self) -> Option<&ScheduledEvent> {
        self.entries.front()
    }

    fn remove_next(&mut self) -> Option<ScheduledEvent> {
        self.entries.pop_front()
    }

    fn remove(&mut self, key: &EventKey) -> Option<ScheduledEvent> {
        let at = self.entries.iter().position(|e| e.key == *key)?;
        self.entries.remove(at)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn name(&self) -> &'static str {
        "list"
    }
}
