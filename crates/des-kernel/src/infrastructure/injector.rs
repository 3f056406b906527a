//! Cross-thread Event Injection
//!
//! ```text
//!   worker thread ──RemoteScheduler──► Mutex<Vec<RemoteEvent>> ─┐
//!   worker thread ──RemoteScheduler──►          ▲               │ take_all()
//!                                     has_pending flag          ▼
//!                                                   Simulator::run (owner thread)
//! ```
//!
//! The simulator itself is single-threaded. Other threads can only append to
//! this queue; the owning thread folds the queued events into its scheduler at
//! the top of each run iteration, relative to its own clock at that moment.
//! Injected events get their uid when merged, so their order among themselves
//! is the order in which they were queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::event::NO_CONTEXT;
use crate::domain::simulator::{fatal, Simulator, SimulatorError};
use crate::domain::time::Time;

/// Event queued from another thread
pub(crate) struct RemoteEvent {
    pub(crate) context: u32,
    pub(crate) delay: Time,
    pub(crate) callback: Box<dyn FnOnce(&mut Simulator) + Send>,
}

/// Shared queue between [`RemoteScheduler`]s and their simulator
#[derive(Default)]
pub(crate) struct RemoteQueue {
    pending: Mutex<Vec<RemoteEvent>>,
    has_pending: AtomicBool,
}

impl RemoteQueue {
    fn push(&self, event: RemoteEvent) {
        let mut pending = self.pending.lock();
        pending.push(event);
        self.has_pending.store(true, Ordering::Release);
    }

    /// Cheap check used on every loop iteration
    #[inline(always)]
    pub(crate) fn has_pending(&self) -> bool {
        self.has_pending.load(Ordering::Acquire)
    }

    pub(crate) fn take_all(&self) -> Vec<RemoteEvent> {
        let mut pending = self.pending.lock();
        self.has_pending.store(false, Ordering::Release);
        std::mem::take(&mut *pending)
    }

    fn len(&self) -> usize {
        self.pending.lock().len()
    }
}

/// Thread-safe handle for scheduling into a [`Simulator`]
///
/// Obtained with [`Simulator::remote`]. `Send + Sync + Clone`; the callbacks
/// must be `Send` because they are built on another thread.
#[derive(Clone)]
pub struct RemoteScheduler {
    queue: Arc<RemoteQueue>,
}

impl RemoteScheduler {
    pub(crate) fn new(queue: Arc<RemoteQueue>) -> Self {
        Self { queue }
    }

    /// Queue `f` to run `delay` after the simulator picks it up, in `context`
    ///
    /// # Panics
    /// On a negative delay.
    pub fn schedule_with_context<F>(&self, context: u32, delay: Time, f: F)
    where
        F: FnOnce(&mut Simulator) + Send + 'static,
    {
        if delay.is_negative() {
            fatal(SimulatorError::NegativeDelay {
                operation: "remote schedule_with_context",
                delay,
            });
        }
        self.queue.push(RemoteEvent {
            context,
            delay,
            callback: Box::new(f),
        });
        tracing::debug!(context, delay = %delay, "remote event queued");
    }

    /// Queue `f` without a context
    pub fn schedule<F>(&self, delay: Time, f: F)
    where
        F: FnOnce(&mut Simulator) + Send + 'static,
    {
        self.schedule_with_context(NO_CONTEXT, delay, f);
    }

    /// Events queued but not yet merged
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl std::fmt::Debug for RemoteScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::thread;

    use super::*;

    fn assert_send_sync<T: Send + Sync + Clone>() {}

    #[test]
    fn test_remote_scheduler_is_send_sync() {
        assert_send_sync::<RemoteScheduler>();
    }

    #[test]
    fn test_events_from_threads_are_merged() {
        let hits = Arc::new(AtomicU32::new(0));
        let mut sim = Simulator::new();
        let remote = sim.remote();

        let workers: Vec<_> = (0..4)
            .map(|i| {
                let remote = remote.clone();
                let hits = Arc::clone(&hits);
                thread::spawn(move || {
                    remote.schedule_with_context(i, Time::from_millis(i64::from(i)), move |sim| {
                        assert_eq!(sim.context(), i);
                        hits.fetch_add(1, Ordering::SeqCst);
                    });
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(remote.pending(), 4);
        assert!(!sim.is_finished());
        sim.run();
        assert_eq!(hits.load(Ordering::SeqCst), 4);
        assert_eq!(remote.pending(), 0);
        assert_eq!(sim.now(), Time::from_millis(3));
    }

    #[test]
    fn test_delay_is_relative_to_merge_time() {
        let mut sim = Simulator::new();
        let remote = sim.remote();
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        sim.schedule(Time::from_secs(10), move |_| {
            remote.schedule(Time::from_secs(1), move |sim| *s.lock() = Some(sim.now()));
        });
        sim.run();
        assert_eq!(*seen.lock(), Some(Time::from_secs(11)));
    }

    #[test]
    #[should_panic(expected = "negative delay")]
    fn test_negative_delay_is_fatal() {
        let sim = Simulator::new();
        sim.remote().schedule(Time::from_secs(-1), |_| {});
    }
}
