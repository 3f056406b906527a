//! Calendar Queue Backend
//!
//! # Structure
//!
//! Time is cut into "days" of `width`; day `k` goes to bucket `k mod n`, so a
//! full turn over the buckets is one "year". Each bucket is a sorted list.
//!
//! ```text
//!  bucket:    0        1        2        3
//!          ┌──────┐ ┌──────┐ ┌──────┐ ┌──────┐
//!  year 0  │ t0   │ │      │ │ t2   │ │      │    ◄── last_bucket, bucket_top
//!  year 1  │ t4   │ │ t5   │ │      │ │ t7   │
//!          └──────┘ └──────┘ └──────┘ └──────┘
//! ```
//!
//! Dequeue resumes from the bucket of the last removed event and walks the
//! buckets one day at a time, taking the first front entry that falls inside
//! the current day. After a full year without a hit it falls back to a direct
//! search of every bucket front.
//!
//! The bucket count doubles when the population exceeds `2n` and halves when
//! it drops below `n / 2`; each resize re-estimates `width` as three times the
//! mean separation of the earliest (up to 25) events, ignoring separations
//! larger than twice the average.
//!
//! # Invariant
//!
//! Every stored timestamp is `>= last_prio`, and `bucket_top` is the end of
//! the day containing `last_prio`. An insert earlier than `last_prio` moves the
//! cursor back to it.

use std::collections::VecDeque;

use crate::domain::event::{EventKey, ScheduledEvent};
use crate::domain::time::Time;

use super::backend::SchedulerBackend;

const MIN_BUCKETS: usize = 2;
const MAX_WIDTH_SAMPLES: usize = 25;

/// Calendar queue (Brown, 1988)
#[derive(Debug)]
pub struct CalendarScheduler {
    buckets: Vec<VecDeque<ScheduledEvent>>,
    /// Day length in resolution units, always >= 1
    width: i128,
    last_bucket: usize,
    bucket_top: i128,
    last_prio: i128,
    len: usize,
}

impl Default for CalendarScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl CalendarScheduler {
    /// Two buckets, one microsecond wide
    pub fn new() -> Self {
        Self::with_layout(MIN_BUCKETS, Self::default_width(), 0)
    }

    fn default_width() -> i128 {
        i128::from(Time::from_micros(1).ticks()).max(1)
    }

    fn with_layout(buckets: usize, width: i128, start: i128) -> Self {
        let mut calendar = Self {
            buckets: (0..buckets).map(|_| VecDeque::new()).collect(),
            width,
            last_bucket: 0,
            bucket_top: 0,
            last_prio: 0,
            len: 0,
        };
        calendar.move_cursor(start);
        calendar
    }

    /// Current number of buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Current day length
    pub fn bucket_width(&self) -> Time {
        ticks_to_time(self.width)
    }

    #[inline(always)]
    fn raw(key: &EventKey) -> i128 {
        i128::from(key.timestamp.ticks())
    }

    fn hash(&self, ts: i128) -> usize {
        ts.div_euclid(self.width)
            .rem_euclid(self.buckets.len() as i128) as usize
    }

    /// End of the day containing `ts`
    fn day_top(&self, ts: i128) -> i128 {
        ts.div_euclid(self.width)
            .saturating_add(1)
            .saturating_mul(self.width)
    }

    fn move_cursor(&mut self, ts: i128) {
        self.last_prio = ts;
        self.last_bucket = self.hash(ts);
        self.bucket_top = self.day_top(ts);
    }

    fn do_insert(&mut self, event: ScheduledEvent) {
        let index = self.hash(Self::raw(&event.key));
        let bucket = &mut self.buckets[index];
        let at = bucket
            .iter()
            .rposition(|e| e.key < event.key)
            .map_or(0, |i| i + 1);
        bucket.insert(at, event);
    }

    /// Bucket holding the earliest event and the day end to resume from
    fn locate_next(&self) -> Option<(usize, i128)> {
        if self.len == 0 {
            return None;
        }

        let n = self.buckets.len();
        let mut i = self.last_bucket;
        let mut top = self.bucket_top;
        let mut best: Option<(usize, EventKey)> = None;
        loop {
            if let Some(front) = self.buckets[i].front() {
                if Self::raw(&front.key) < top {
                    return Some((i, top));
                }
                if best.map_or(true, |(_, key)| front.key < key) {
                    best = Some((i, front.key));
                }
            }
            i = (i + 1) % n;
            top = top.saturating_add(self.width);
            if i == self.last_bucket {
                break;
            }
        }

        // No event within a year: direct search
        best.map(|(bucket, key)| (bucket, self.day_top(Self::raw(&key))))
    }

    fn resize(&mut self, buckets: usize) {
        let mut entries: Vec<ScheduledEvent> = Vec::with_capacity(self.len);
        for bucket in &mut self.buckets {
            entries.extend(bucket.drain(..));
        }
        entries.sort_by_key(|e| e.key);

        let width = estimate_width(&entries).unwrap_or(self.width);
        tracing::trace!(
            from = self.buckets.len(),
            to = buckets,
            width = %ticks_to_time(width),
            "calendar resize"
        );

        let len = self.len;
        *self = Self::with_layout(buckets, width, self.last_prio);
        for event in entries {
            self.do_insert(event);
        }
        self.len = len;
    }

    fn resize_up(&mut self) {
        if self.len > self.buckets.len() * 2 {
            self.resize(self.buckets.len() * 2);
        }
    }

    fn resize_down(&mut self) {
        if self.buckets.len() > MIN_BUCKETS && self.len < self.buckets.len() / 2 {
            self.resize(self.buckets.len() / 2);
        }
    }
}

fn ticks_to_time(ticks: i128) -> Time {
    Time::from_ticks(i64::try_from(ticks).unwrap_or(i64::MAX))
}

/// Three times the mean separation of the earliest events, dropping outliers
fn estimate_width(sorted: &[ScheduledEvent]) -> Option<i128> {
    if sorted.len() < 2 {
        return None;
    }
    let samples = if sorted.len() <= 5 {
        sorted.len()
    } else {
        (5 + sorted.len() / 10).min(MAX_WIDTH_SAMPLES)
    };

    let gaps: Vec<i128> = sorted[..samples]
        .windows(2)
        .map(|w| CalendarScheduler::raw(&w[1].key).saturating_sub(CalendarScheduler::raw(&w[0].key)))
        .collect();
    let total = gaps.iter().fold(0_i128, |acc, g| acc.saturating_add(*g));
    let twice_average = (total / gaps.len() as i128).saturating_mul(2);

    let (sum, count) = gaps
        .iter()
        .filter(|g| **g < twice_average)
        .fold((0_i128, 0_i128), |(sum, count), g| (sum.saturating_add(*g), count + 1));
    if count == 0 {
        return None;
    }
    Some((sum / count).saturating_mul(3).max(1))
}

impl SchedulerBackend for CalendarScheduler {
    fn insert(&mut self, event: ScheduledEvent) {
        let ts = Self::raw(&event.key);
        if ts < self.last_prio {
            self.move_cursor(ts);
        }
        self.do_insert(event);
        self.len += 1;
        self.resize_up();
    }

    fn peek_next(&self) -> Option<&ScheduledEvent> {
        let (bucket, _) = self.locate_next()?;
        self.buckets[bucket].front()
    }

    fn remove_next(&mut self) -> Option<ScheduledEvent> {
        let (bucket, top) = self.locate_next()?;
        let event = self.buckets[bucket].pop_front()?;
        self.last_bucket = bucket;
        self.bucket_top = top;
        self.last_prio = Self::raw(&event.key);
        self.len -= 1;
        self.resize_down();
        Some(event)
    }

    fn remove(&mut self, key: &EventKey) -> Option<ScheduledEvent> {
        let index = self.hash(Self::raw(key));
        let bucket = &mut self.buckets[index];
        let at = bucket.iter().position(|e| e.key == *key)?;
        let event = bucket.remove(at)?;
        self.len -= 1;
        self.resize_down();
        Some(event)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn name(&self) -> &'static str {
        "calendar"
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::domain::scheduler::backend::tests::{check_backend_contract, entry};
    use crate::domain::time::TimeUnit;

    #[test]
    fn test_backend_contract() {
        check_backend_contract(&mut CalendarScheduler::new());
    }

    #[test]
    fn test_grows_and_shrinks() {
        let mut calendar = CalendarScheduler::new();
        for uid in 0..64 {
            calendar.insert(entry(uid as i64 * 3, uid));
        }
        assert!(calendar.bucket_count() >= 32);
        assert!(calendar.bucket_width() > Time::ZERO);

        let popped: Vec<u64> = (0..60)
            .filter_map(|_| calendar.remove_next().map(|e| e.key.uid))
            .collect();
        assert_eq!(popped, (0..60).collect::<Vec<_>>());
        assert!(calendar.bucket_count() <= 8);
        assert_eq!(calendar.len(), 4);
    }

    #[test]
    fn test_sparse_far_future_uses_direct_search() {
        let mut calendar = CalendarScheduler::new();
        calendar.insert(entry(1, 0));
        calendar.insert(entry(10_000_000, 1));
        calendar.insert(entry(5, 2));
        let order: Vec<u64> = calendar.drain().iter().map(|e| e.key.uid).collect();
        assert_eq!(order, vec![0, 2, 1]);
    }

    #[test]
    fn test_insert_before_cursor() {
        let mut calendar = CalendarScheduler::new();
        calendar.insert(entry(50, 0));
        calendar.insert(entry(60, 1));
        assert_eq!(calendar.remove_next().map(|e| e.key.uid), Some(0));
        // earlier than the last dequeued event
        calendar.insert(entry(10, 2));
        assert_eq!(calendar.peek_next().map(|e| e.key.uid), Some(2));
        assert_eq!(calendar.remove_next().map(|e| e.key.uid), Some(2));
        assert_eq!(calendar.remove_next().map(|e| e.key.uid), Some(1));
    }

    #[test]
    fn test_hold_model_matches_sorted_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut calendar = CalendarScheduler::new();
        let mut now = 0_i64;
        let mut uid = 0;
        for _ in 0..200 {
            calendar.insert(entry(rng.gen_range(0..1_000), uid));
            uid += 1;
        }
        for _ in 0..2_000 {
            let next = calendar.remove_next().map(|e| e.key);
            let Some(next) = next else { break };
            let ms = next.timestamp.to_integer(TimeUnit::Ms);
            assert!(ms >= now, "went back in time: {ms} < {now}");
            now = ms;
            calendar.insert(entry(now + rng.gen_range(0..1_000), uid));
            uid += 1;
        }
        assert_eq!(calendar.len(), 200);
    }
}
