//! Ordered Map Backend
//!
//! A `BTreeMap` keyed by the full [`EventKey`]. Because the uid is unique the
//! key never collides, even for equal timestamps. Every operation, including
//! removal of an arbitrary key, is O(log n).

use std::collections::BTreeMap;

use crate::domain::event::{EventKey, ScheduledEvent};

use super::backend::SchedulerBackend;

/// B-tree keyed by `(timestamp, uid)`
#[derive(Debug, Default)]
pub struct MapScheduler {
    entries: BTreeMap<EventKey, ScheduledEvent>,
}

impl MapScheduler {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchedulerBackend for MapScheduler {
    fn insert(&mut self, event: ScheduledEvent) {
        let previous = self.entries.insert(event.key, event);
        debug_assert!(previous.is_none(), "duplicate event key inserted");
    }

    fn peek_next(&self) -> Option<&ScheduledEvent> {
        self.entries.first_key_value().map(|(_, event)| event)
    }

    fn remove_next(&mut self) -> Option<ScheduledEvent> {
        self.entries.pop_first().map(|(_, event)| event)
    }

    fn remove(&mut self, key: &EventKey) -> Option<ScheduledEvent> {
        self.entries.remove(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn name(&self) -> &'static str {
        "map"
    }
}
