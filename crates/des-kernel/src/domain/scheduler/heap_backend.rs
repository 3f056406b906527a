//! Binary Min-heap Backend
//!
//! # Layout
//!
//! Indices are 1-based so the parent/child arithmetic stays branch-free, but
//! storage is 0-based: logical slot `i` lives at `entries[i - 1]`. There is
//! no unused slot 0, so the root is `entries[0]` and `len()` is the last
//! logical index. `key`, `exch` and `take` apply the `- 1` offset.
//!
//! ```text
//!   logical      1
//!              /   \
//!             2     3          parent(i) = i / 2
//!            / \   / \         left(i)   = 2i
//!           4   5 6   7        right(i)  = 2i + 1
//! ```
//!
//! - **insert**: append, then bottom-up (swap with the parent while strictly
//!   smaller).
//! - **remove_next**: move the last entry to the root, then top-down.
//! - **remove(key)**: linear scan, swap with the last entry, then restore the
//!   heap in *both* directions from the vacated slot. The moved entry came from
//!   an unrelated subtree and can be smaller than its new parent.
//!
//! O(log n) insert/pop, O(n) arbitrary removal. For cancellation-heavy
//! workloads the map backend is the better choice.

use crate::domain::event::{EventKey, ScheduledEvent};

use super::backend::SchedulerBackend;

const ROOT: usize = 1;

/// Binary heap over a contiguous vector
#[derive(Debug, Default)]
pub struct HeapScheduler {
    entries: Vec<ScheduledEvent>,
}

impl HeapScheduler {
    /// Empty heap
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty heap with room for `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    #[inline(always)]
    const fn parent(id: usize) -> usize {
        id / 2
    }

    #[inline(always)]
    const fn left(id: usize) -> usize {
        id * 2
    }

    #[inline(always)]
    const fn right(id: usize) -> usize {
        id * 2 + 1
    }

    #[inline(always)]
    fn last(&self) -> usize {
        self.entries.len()
    }

    #[inline(always)]
    fn key(&self, id: usize) -> &EventKey {
        &self.entries[id - 1].key
    }

    #[inline(always)]
    fn is_less(&self, a: usize, b: usize) -> bool {
        self.key(a) < self.key(b)
    }

    #[inline(always)]
    fn exch(&mut self, a: usize, b: usize) {
        self.entries.swap(a - 1, b - 1);
    }

    /// Smaller of `id`'s children, or `None` at the bottom
    fn smallest_child(&self, id: usize) -> Option<usize> {
        let left = Self::left(id);
        if left > self.last() {
            return None;
        }
        let right = Self::right(id);
        if right <= self.last() && self.is_less(right, left) {
            Some(right)
        } else {
            Some(left)
        }
    }

    fn bottom_up(&mut self, mut id: usize) {
        while id > ROOT {
            let parent = Self::parent(id);
            if !self.is_less(id, parent) {
                break;
            }
            self.exch(id, parent);
            id = parent;
        }
    }

    fn top_down(&mut self, mut id: usize) {
        while let Some(child) = self.smallest_child(id) {
            if !self.is_less(child, id) {
                break;
            }
            self.exch(id, child);
            id = child;
        }
    }

    /// Remove slot `id`, refilling it with the last entry
    fn take(&mut self, id: usize) -> ScheduledEvent {
        let taken = self.entries.swap_remove(id - 1);
        if id <= self.last() {
            self.top_down(id);
            self.bottom_up(id);
        }
        taken
    }

    /// Check the min-heap property at every slot
    #[cfg(test)]
    pub(crate) fn is_valid_heap(&self) -> bool {
        (ROOT + 1..=self.last()).all(|id| !self.is_less(id, Self::parent(id)))
    }
}

impl SchedulerBackend for HeapScheduler {
    fn insert(&mut self, event: ScheduledEvent) {
        self.entries.push(event);
        self.bottom_up(self.last());
    }

    fn peek_next(&self) -> Option<&ScheduledEvent> {
        self.entries.first()
    }

    fn remove_next(&mut self) -> Option<ScheduledEvent> {
        if self.entries.is_empty() {
            return None;
        }
        Some(self.take(ROOT))
    }

    fn remove(&mut self, key: &EventKey) -> Option<ScheduledEvent> {
        let index = self.entries.iter().position(|e| e.key == *key)?;
        Some(self.take(index + 1))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn name(&self) -> &'static str {
        "heap"
    }
}
