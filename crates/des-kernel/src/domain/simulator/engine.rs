//! Sequential Event Loop
//!
//! # Execution Model
//!
//! ```text
//!   schedule(delay, f) ──► [ backend: (ts, uid) ordered ] ──► remove_next
//!                                                                 │
//!          ┌──────────────────────────────────────────────────────┘
//!          ▼
//!   now := ts ; context := event.context ; f(&mut simulator)
//!          │
//!          └── f may schedule / cancel / remove / stop
//! ```
//!
//! One event at a time, on the caller's thread. The clock only moves when an
//! event is dequeued (or a stop time is reached), so it never decreases.
//!
//! Each `run()` iteration first folds in events queued through a
//! [`RemoteScheduler`], then honours an immediate `stop()`, then a stop time
//! armed with `stop_at()`, and only then dispatches the next event.
//!
//! # Cancellation
//!
//! `cancel` is lazy: the event stays queued and is skipped when its turn comes
//! (its captured state is released immediately). `remove` takes it out of the
//! backend right away.

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};

use crate::domain::event::{
    Callback, EventId, EventImpl, EventKey, EventKind, ScheduledEvent, NO_CONTEXT,
};
use crate::domain::scheduler::SchedulerBackend;
use crate::domain::time::{Time, TimeUnit};
use crate::infrastructure::injector::{RemoteQueue, RemoteScheduler};

use super::config::SimulatorConfig;
use super::error::{fatal, ConfigError, SimulatorError};

/// Lifecycle of a [`Simulator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulatorState {
    /// Built, never run
    Uninitialized,
    /// Inside `run()` or `step()`
    Running,
    /// Between runs
    Idle,
}

/// Discrete-event simulator
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use des_kernel::{Simulator, Time};
///
/// let log = Rc::new(RefCell::new(Vec::new()));
/// let mut sim = Simulator::new();
///
/// let l = Rc::clone(&log);
/// sim.schedule(Time::from_millis(20), move |sim| l.borrow_mut().push(("b", sim.now())));
/// let l = Rc::clone(&log);
/// sim.schedule(Time::from_millis(10), move |sim| l.borrow_mut().push(("a", sim.now())));
///
/// sim.run();
/// assert_eq!(
///     *log.borrow(),
///     vec![("a", Time::from_millis(10)), ("b", Time::from_millis(20))]
/// );
/// ```
pub struct Simulator {
    backend: Box<dyn SchedulerBackend>,
    destroy_events: VecDeque<ScheduledEvent>,
    remote: Arc<RemoteQueue>,
    current_time: Time,
    /// Uid of the event being executed
    current_uid: Option<u64>,
    current_context: u32,
    next_uid: u64,
    stop_requested: bool,
    stop_time: Option<Time>,
    state: SimulatorState,
    event_count: u64,
    resolution: TimeUnit,
    destroyed: bool,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Construction
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Heap backend, nanosecond resolution
    pub fn new() -> Self {
        Self::with_config(SimulatorConfig::default())
    }

    /// Build from a configuration
    ///
    /// # Panics
    /// When `config.resolution` differs from the resolution already in effect.
    pub fn with_config(config: SimulatorConfig) -> Self {
        match Self::try_with_config(config) {
            Ok(simulator) => simulator,
            Err(error) => {
                error!(%error, "invalid simulator configuration");
                panic!("{error}")
            }
        }
    }

    /// Build from a configuration, applying its resolution to [`Time`]
    pub fn try_with_config(config: SimulatorConfig) -> Result<Self, ConfigError> {
        Time::set_resolution(config.resolution)?;
        Ok(Self::with_backend(config.scheduler.create()))
    }

    /// Build around a caller-provided backend
    pub fn with_backend(backend: Box<dyn SchedulerBackend>) -> Self {
        debug!(scheduler = backend.name(), "simulator created");
        Self {
            backend,
            destroy_events: VecDeque::new(),
            remote: Arc::new(RemoteQueue::default()),
            current_time: Time::ZERO,
            current_uid: None,
            current_context: NO_CONTEXT,
            next_uid: 0,
            stop_requested: false,
            stop_time: None,
            state: SimulatorState::Uninitialized,
            event_count: 0,
            resolution: Time::resolution(),
            destroyed: false,
        }
    }

    /// Replace the backend, moving every pending event into the new one
    ///
    /// Handles stay valid: entries keep their key and identity.
    pub fn set_scheduler(&mut self, mut backend: Box<dyn SchedulerBackend>) {
        let pending = self.backend.drain();
        let moved = pending.len();
        for event in pending {
            backend.insert(event);
        }
        info!(from = self.backend.name(), to = backend.name(), moved, "scheduler replaced");
        self.backend = backend;
    }

    /// Handle for scheduling from other threads
    pub fn remote(&self) -> RemoteScheduler {
        RemoteScheduler::new(Arc::clone(&self.remote))
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Scheduling
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Run `f` after `delay`, in the current context
    ///
    /// # Panics
    /// On a negative delay or when `now + delay` overflows.
    pub fn schedule<F>(&mut self, delay: Time, f: F) -> EventId
    where
        F: FnOnce(&mut Simulator) + 'static,
    {
        self.try_schedule(delay, f).unwrap_or_else(|error| fatal(error))
    }

    /// Fallible [`Simulator::schedule`]
    pub fn try_schedule<F>(&mut self, delay: Time, f: F) -> Result<EventId, SimulatorError>
    where
        F: FnOnce(&mut Simulator) + 'static,
    {
        let timestamp = self.absolute("schedule", delay)?;
        Ok(self.insert_timed(timestamp, self.current_context, Box::new(f)))
    }

    /// Run `f` at the current time, after everything already due now
    pub fn schedule_now<F>(&mut self, f: F) -> EventId
    where
        F: FnOnce(&mut Simulator) + 'static,
    {
        self.schedule(Time::ZERO, f)
    }

    /// Run `f` at the absolute time `at`
    ///
    /// # Panics
    /// When `at` is before [`Simulator::now`].
    pub fn schedule_at<F>(&mut self, at: Time, f: F) -> EventId
    where
        F: FnOnce(&mut Simulator) + 'static,
    {
        self.try_schedule_at(at, f).unwrap_or_else(|error| fatal(error))
    }

    /// Fallible [`Simulator::schedule_at`]
    pub fn try_schedule_at<F>(&mut self, at: Time, f: F) -> Result<EventId, SimulatorError>
    where
        F: FnOnce(&mut Simulator) + 'static,
    {
        if at < self.current_time {
            return Err(SimulatorError::CausalityViolation {
                operation: "schedule_at",
                requested: at,
                now: self.current_time,
            });
        }
        Ok(self.insert_timed(at, self.current_context, Box::new(f)))
    }

    /// Run `f` after `delay` with an explicit context value
    pub fn schedule_with_context<F>(&mut self, context: u32, delay: Time, f: F) -> EventId
    where
        F: FnOnce(&mut Simulator) + 'static,
    {
        match self.absolute("schedule_with_context", delay) {
            Ok(timestamp) => self.insert_timed(timestamp, context, Box::new(f)),
            Err(error) => fatal(error),
        }
    }

    /// Run `f` once, from [`Simulator::destroy`], in FIFO order with other
    /// destroy events
    pub fn schedule_destroy<F>(&mut self, f: F) -> EventId
    where
        F: FnOnce(&mut Simulator) + 'static,
    {
        let key = EventKey::new(Time::ZERO, self.allocate_uid());
        let event = Rc::new(EventImpl::new(self.current_context, Box::new(f)));
        let id = EventId::new(&event, key, EventKind::Destroy);
        self.destroy_events.push_back(ScheduledEvent::new(key, event));
        debug!(uid = key.uid, "destroy event scheduled");
        id
    }

    fn absolute(&self, operation: &'static str, delay: Time) -> Result<Time, SimulatorError> {
        if delay.is_negative() {
            return Err(SimulatorError::CausalityViolation {
                operation,
                requested: self.current_time.saturating_add(delay),
                now: self.current_time,
            });
        }
        self.current_time
            .checked_add(delay)
            .ok_or(SimulatorError::TimeOverflow {
                now: self.current_time,
                delay,
            })
    }

    #[inline(always)]
    fn allocate_uid(&mut self) -> u64 {
        let uid = self.next_uid;
        self.next_uid += 1;
        uid
    }

    fn insert_timed(&mut self, timestamp: Time, context: u32, callback: Callback) -> EventId {
        let key = EventKey::new(timestamp, self.allocate_uid());
        let event = Rc::new(EventImpl::new(context, callback));
        let id = EventId::new(&event, key, EventKind::Timed);
        self.backend.insert(ScheduledEvent::new(key, event));
        debug!(
            uid = key.uid,
            at = %timestamp.display(self.resolution),
            context,
            "event scheduled"
        );
        id
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Cancellation
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Keep the event from running. No-op for null, stale or expired handles.
    pub fn cancel(&mut self, id: &EventId) {
        if self.is_expired(id) {
            return;
        }
        id.cancel();
        debug!(uid = id.uid(), "event cancelled");
    }

    /// Take a pending event out of its queue
    ///
    /// # Panics
    /// On the null handle or an event that is no longer pending.
    pub fn remove(&mut self, id: &EventId) {
        if let Err(error) = self.try_remove(id) {
            fatal(error);
        }
    }

    /// Fallible [`Simulator::remove`]
    pub fn try_remove(&mut self, id: &EventId) -> Result<(), SimulatorError> {
        let not_pending = SimulatorError::EventNotPending {
            operation: "remove",
            uid: id.uid(),
        };
        let removed = match id.kind() {
            EventKind::Null => return Err(SimulatorError::NullEvent { operation: "remove" }),
            EventKind::Destroy => {
                let at = self
                    .destroy_events
                    .iter()
                    .position(|e| e.key.uid == id.uid())
                    .ok_or_else(|| not_pending.clone())?;
                self.destroy_events.remove(at).ok_or(not_pending)?
            }
            EventKind::Timed => {
                if id.upgrade().is_none() || self.current_uid == Some(id.uid()) {
                    return Err(not_pending);
                }
                self.backend.remove(&id.key()).ok_or(not_pending)?
            }
        };
        removed.event.cancel();
        debug!(uid = id.uid(), "event removed");
        Ok(())
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Queries
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Current simulated time
    #[inline(always)]
    pub fn now(&self) -> Time {
        self.current_time
    }

    /// Context of the executing event, [`NO_CONTEXT`] outside events
    #[inline(always)]
    pub fn context(&self) -> u32 {
        self.current_context
    }

    /// `true` once the event can no longer run: already ran, is running,
    /// was cancelled or removed, or the handle is null
    pub fn is_expired(&self, id: &EventId) -> bool {
        match id.kind() {
            EventKind::Null => true,
            EventKind::Timed => id.is_expired() || self.current_uid == Some(id.uid()),
            EventKind::Destroy => {
                id.is_expired() || !self.destroy_events.iter().any(|e| e.key.uid == id.uid())
            }
        }
    }

    /// Time until the event fires; zero once expired
    pub fn delay_left(&self, id: &EventId) -> Time {
        if id.kind() != EventKind::Timed || self.is_expired(id) {
            return Time::ZERO;
        }
        id.timestamp() - self.current_time
    }

    /// Largest time the clock can represent
    pub fn maximum_simulation_time(&self) -> Time {
        Time::MAX
    }

    /// Number of events actually invoked (cancelled ones excluded)
    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Entries in the backend, including cancelled ones not yet skipped
    pub fn pending_events(&self) -> usize {
        self.backend.len()
    }

    /// Name of the active backend
    pub fn scheduler_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Lifecycle state
    pub fn state(&self) -> SimulatorState {
        self.state
    }

    /// Unit every [`Time`] counts in
    pub fn resolution(&self) -> TimeUnit {
        self.resolution
    }

    /// `true` when no timed event is waiting, locally or from other threads
    pub fn is_finished(&self) -> bool {
        self.backend.is_empty() && !self.remote.has_pending()
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Execution
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// End the current `run()` after the executing event returns
    pub fn stop(&mut self) {
        debug!(at = %self.current_time.display(self.resolution), "stop requested");
        self.stop_requested = true;
    }

    /// End `run()` at `now + delay`; events at or after that time stay queued
    ///
    /// A later call replaces the armed stop time. The stop time outlives a
    /// run that ended because the queue drained.
    ///
    /// # Panics
    /// On a negative delay or when `now + delay` overflows.
    pub fn stop_at(&mut self, delay: Time) {
        let at = self
            .absolute("stop_at", delay)
            .unwrap_or_else(|error| fatal(error));
        debug!(at = %at.display(self.resolution), "stop armed");
        self.stop_time = Some(at);
    }

    /// Dispatch events in order until the queue drains or a stop fires
    ///
    /// # Panics
    /// When called from inside an event.
    pub fn run(&mut self) {
        if self.state == SimulatorState::Running {
            fatal(SimulatorError::ReentrantRun);
        }
        self.state = SimulatorState::Running;
        let started_with = self.event_count;
        info!(
            scheduler = self.backend.name(),
            pending = self.backend.len(),
            now = %self.current_time.display(self.resolution),
            "simulation started"
        );

        loop {
            self.merge_remote_events();
            if self.stop_requested {
                break;
            }
            let Some(next) = self.backend.peek_next().map(|e| e.key.timestamp) else {
                break;
            };
            if let Some(stop) = self.stop_time {
                if next >= stop {
                    self.current_time = self.current_time.max(stop);
                    self.stop_time = None;
                    break;
                }
            }
            self.process_one_event();
        }

        self.stop_requested = false;
        self.state = SimulatorState::Idle;
        info!(
            events = self.event_count - started_with,
            pending = self.backend.len(),
            now = %self.current_time.display(self.resolution),
            "simulation ended"
        );
    }

    /// Dispatch exactly one entry; `false` when nothing was queued
    ///
    /// Stop requests and stop times only apply to `run()`.
    pub fn step(&mut self) -> bool {
        if self.state == SimulatorState::Running {
            fatal(SimulatorError::ReentrantRun);
        }
        self.merge_remote_events();
        if self.backend.is_empty() {
            return false;
        }
        self.state = SimulatorState::Running;
        self.process_one_event();
        self.state = SimulatorState::Idle;
        true
    }

    fn process_one_event(&mut self) {
        let Some(next) = self.backend.remove_next() else {
            return;
        };
        if next.key.timestamp < self.current_time {
            fatal(SimulatorError::CausalityViolation {
                operation: "dispatch",
                requested: next.key.timestamp,
                now: self.current_time,
            });
        }

        self.current_time = next.key.timestamp;
        if next.event.is_cancelled() {
            trace!(uid = next.key.uid, "skipping cancelled event");
            return;
        }

        self.current_uid = Some(next.key.uid);
        self.current_context = next.event.context();
        self.event_count += 1;
        trace!(
            uid = next.key.uid,
            at = %self.current_time.display(self.resolution),
            context = self.current_context,
            "dispatch"
        );
        next.event.invoke(self);
        self.current_uid = None;
        self.current_context = NO_CONTEXT;
    }

    fn merge_remote_events(&mut self) {
        if !self.remote.has_pending() {
            return;
        }
        let injected = self.remote.take_all();
        let count = injected.len();
        for remote in injected {
            let timestamp = self
                .current_time
                .checked_add(remote.delay)
                .unwrap_or_else(|| {
                    fatal(SimulatorError::TimeOverflow {
                        now: self.current_time,
                        delay: remote.delay,
                    })
                });
            self.insert_timed(timestamp, remote.context, remote.callback);
        }
        debug!(count, "merged remote events");
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Teardown
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Run every destroy event in FIFO order, then release what is left
    ///
    /// Destroy events may schedule further destroy events; those run too.
    pub fn destroy(mut self) {
        info!(
            destroy_events = self.destroy_events.len(),
            now = %self.current_time.display(self.resolution),
            "destroying simulator"
        );
        while let Some(entry) = self.destroy_events.pop_front() {
            if entry.event.is_cancelled() {
                continue;
            }
            self.current_uid = Some(entry.key.uid);
            self.current_context = entry.event.context();
            entry.event.invoke(&mut self);
        }
        self.current_uid = None;
        self.current_context = NO_CONTEXT;

        let released = self.backend.drain().len() + self.remote.take_all().len();
        self.destroyed = true;
        info!(released, "simulator destroyed");
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        if !self.destroyed && !self.destroy_events.is_empty() {
            warn!(
                skipped = self.destroy_events.len(),
                "simulator dropped without destroy(); destroy events not run"
            );
        }
    }
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("scheduler", &self.backend.name())
            .field("now", &self.current_time)
            .field("pending", &self.backend.len())
            .field("destroy_events", &self.destroy_events.len())
            .field("event_count", &self.event_count)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::domain::scheduler::{HeapScheduler, SchedulerKind};
    use crate::domain::time::ResolutionError;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn push(log: &Log, tag: &'static str) -> impl FnOnce(&mut Simulator) + 'static {
        let log = Rc::clone(log);
        move |_: &mut Simulator| log.borrow_mut().push(tag)
    }

    #[test]
    fn test_new_simulator() {
        let sim = Simulator::new();
        assert_eq!(sim.now(), Time::ZERO);
        assert_eq!(sim.state(), SimulatorState::Uninitialized);
        assert_eq!(sim.context(), NO_CONTEXT);
        assert_eq!(sim.scheduler_name(), "heap");
        assert!(sim.is_finished());
        assert_eq!(sim.maximum_simulation_time(), Time::MAX);
    }

    #[test]
    fn test_events_run_in_time_then_uid_order() {
        let order = log();
        let mut sim = Simulator::new();
        sim.schedule(Time::from_millis(10), push(&order, "b"));
        sim.schedule(Time::from_millis(5), push(&order, "a"));
        sim.schedule(Time::from_millis(10), push(&order, "c"));
        sim.run();
        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
        assert_eq!(sim.now(), Time::from_millis(10));
        assert_eq!(sim.event_count(), 3);
        assert_eq!(sim.state(), SimulatorState::Idle);
    }

    #[test]
    fn test_chained_delay_ties_with_direct_delay() {
        for kind in SchedulerKind::ALL {
            let order = log();
            let mut sim = Simulator::with_config(SimulatorConfig::new().with_scheduler(kind));
            sim.schedule(Time::from_millis(6), push(&order, "direct"));
            let o = Rc::clone(&order);
            sim.schedule(Time::from_millis(2), move |sim| {
                sim.schedule(Time::from_millis(4), push(&o, "chained"));
            });
            sim.run();
            assert_eq!(*order.borrow(), vec!["direct", "chained"], "backend {kind}");
            assert_eq!(sim.now(), Time::from_millis(6), "backend {kind}");
        }
    }

    #[test]
    fn test_conflicting_resolution_is_a_config_error() {
        assert_eq!(Time::resolution(), TimeUnit::Ns);
        let config = SimulatorConfig::new().with_resolution(TimeUnit::Ps);
        assert_eq!(
            Simulator::try_with_config(config).map(|sim| sim.scheduler_name()),
            Err(ConfigError::Resolution(ResolutionError {
                current: TimeUnit::Ns,
                requested: TimeUnit::Ps,
            }))
        );
        assert!(Simulator::try_with_config(SimulatorConfig::new()).is_ok());
    }

    #[test]
    #[should_panic(expected = "cannot switch to us")]
    fn test_conflicting_resolution_panics_in_with_config() {
        assert_eq!(Time::resolution(), TimeUnit::Ns);
        Simulator::with_config(SimulatorConfig::new().with_resolution(TimeUnit::Us));
    }

    #[test]
    fn test_schedule_from_inside_event() {
        let seen = Rc::new(Cell::new(Time::ZERO));
        let mut sim = Simulator::new();
        let s = Rc::clone(&seen);
        sim.schedule(Time::from_secs(1), move |sim| {
            sim.schedule(Time::from_secs(2), move |sim| s.set(sim.now()));
        });
        sim.run();
        assert_eq!(seen.get(), Time::from_secs(3));
    }

    #[test]
    fn test_schedule_now_runs_after_already_due_events() {
        let order = log();
        let mut sim = Simulator::new();
        let o = Rc::clone(&order);
        sim.schedule(Time::from_secs(1), move |sim| {
            o.borrow_mut().push("first");
            sim.schedule_now(push(&o, "now"));
        });
        sim.schedule(Time::from_secs(1), push(&order, "second"));
        sim.run();
        assert_eq!(*order.borrow(), vec!["first", "second", "now"]);
    }

    #[test]
    fn test_negative_delay_is_rejected() {
        let mut sim = Simulator::new();
        let error = sim.try_schedule(Time::from_millis(-1), |_| {}).unwrap_err();
        assert!(matches!(
            error,
            SimulatorError::CausalityViolation { operation: "schedule", .. }
        ));
        assert_eq!(sim.pending_events(), 0);
    }

    #[test]
    #[should_panic(expected = "schedule: requested time")]
    fn test_negative_delay_is_fatal() {
        let mut sim = Simulator::new();
        sim.schedule(Time::from_millis(-1), |_| {});
    }

    #[test]
    fn test_schedule_at_in_the_past_is_rejected() {
        let mut sim = Simulator::new();
        sim.schedule(Time::from_secs(5), |sim| {
            let error = sim.try_schedule_at(Time::from_secs(1), |_| {}).unwrap_err();
            assert_eq!(
                error,
                SimulatorError::CausalityViolation {
                    operation: "schedule_at",
                    requested: Time::from_secs(1),
                    now: Time::from_secs(5),
                }
            );
            sim.schedule_at(Time::from_secs(5), |_| {});
        });
        sim.run();
        assert_eq!(sim.event_count(), 2);
    }

    #[test]
    fn test_overflow_is_reported() {
        let mut sim = Simulator::new();
        sim.schedule(Time::from_secs(1), |sim| {
            let error = sim.try_schedule(Time::MAX, |_| {}).unwrap_err();
            assert!(matches!(error, SimulatorError::TimeOverflow { .. }));
        });
        sim.run();
    }

    #[test]
    fn test_cancel_skips_event_and_is_idempotent() {
        let order = log();
        let mut sim = Simulator::new();
        let id = sim.schedule(Time::from_secs(1), push(&order, "cancelled"));
        sim.schedule(Time::from_secs(2), push(&order, "kept"));
        sim.cancel(&id);
        sim.cancel(&id);
        assert!(sim.is_expired(&id));
        assert_eq!(sim.pending_events(), 2);
        sim.run();
        assert_eq!(*order.borrow(), vec!["kept"]);
        assert_eq!(sim.event_count(), 1);
        sim.cancel(&id);
        sim.cancel(&EventId::null());
    }

    #[test]
    fn test_remove_takes_event_out() {
        let order = log();
        let mut sim = Simulator::new();
        let id = sim.schedule(Time::from_secs(1), push(&order, "removed"));
        sim.remove(&id);
        assert_eq!(sim.pending_events(), 0);
        assert!(sim.is_expired(&id));
        assert_eq!(
            sim.try_remove(&id),
            Err(SimulatorError::EventNotPending { operation: "remove", uid: id.uid() })
        );
        sim.run();
        assert!(order.borrow().is_empty());
    }

    #[test]
    fn test_remove_null_handle_is_an_error() {
        let mut sim = Simulator::new();
        assert_eq!(
            sim.try_remove(&EventId::null()),
            Err(SimulatorError::NullEvent { operation: "remove" })
        );
    }

    #[test]
    #[should_panic(expected = "is not pending")]
    fn test_remove_after_run_is_fatal() {
        let mut sim = Simulator::new();
        let id = sim.schedule(Time::from_secs(1), |_| {});
        sim.run();
        sim.remove(&id);
    }

    #[test]
    fn test_running_event_is_expired() {
        let mut sim = Simulator::new();
        let own = Rc::new(RefCell::new(EventId::null()));
        let o = Rc::clone(&own);
        let id = sim.schedule(Time::from_secs(1), move |sim| {
            let id = o.borrow().clone();
            assert!(sim.is_expired(&id));
            assert_eq!(sim.delay_left(&id), Time::ZERO);
            assert!(sim.try_remove(&id).is_err());
        });
        *own.borrow_mut() = id.clone();
        assert!(!sim.is_expired(&id));
        sim.run();
        assert!(sim.is_expired(&id));
    }

    #[test]
    fn test_delay_left() {
        let mut sim = Simulator::new();
        let later = sim.schedule(Time::from_secs(10), |_| {});
        let handle = later.clone();
        sim.schedule(Time::from_secs(4), move |sim| {
            assert_eq!(sim.delay_left(&handle), Time::from_secs(6));
        });
        assert_eq!(sim.delay_left(&later), Time::from_secs(10));
        sim.run();
        assert_eq!(sim.delay_left(&later), Time::ZERO);
    }

    #[test]
    fn test_context_follows_event() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut sim = Simulator::new();
        let s = Rc::clone(&seen);
        sim.schedule_with_context(7, Time::from_secs(1), move |sim| {
            s.borrow_mut().push(sim.context());
            let s = Rc::clone(&s);
            // inherits 7
            sim.schedule(Time::from_secs(1), move |sim| s.borrow_mut().push(sim.context()));
        });
        let s = Rc::clone(&seen);
        sim.schedule(Time::from_secs(5), move |sim| s.borrow_mut().push(sim.context()));
        sim.run();
        assert_eq!(*seen.borrow(), vec![7, 7, NO_CONTEXT]);
        assert_eq!(sim.context(), NO_CONTEXT);
    }

    #[test]
    fn test_stop_ends_run_after_current_event() {
        let order = log();
        let mut sim = Simulator::new();
        let o = Rc::clone(&order);
        sim.schedule(Time::from_secs(1), move |sim| {
            o.borrow_mut().push("stopper");
            sim.stop();
        });
        sim.schedule(Time::from_secs(1), push(&order, "same time"));
        sim.schedule(Time::from_secs(2), push(&order, "later"));
        sim.run();
        assert_eq!(*order.borrow(), vec!["stopper"]);
        assert_eq!(sim.now(), Time::from_secs(1));
        assert_eq!(sim.pending_events(), 2);

        // a fresh run resumes where the last one stopped
        sim.run();
        assert_eq!(*order.borrow(), vec!["stopper", "same time", "later"]);
    }

    #[test]
    fn test_stop_at_sets_clock_to_stop_time() {
        let order = log();
        let mut sim = Simulator::new();
        sim.schedule(Time::from_secs(1), push(&order, "early"));
        sim.schedule(Time::from_secs(50), push(&order, "at stop"));
        sim.schedule(Time::from_secs(100), push(&order, "late"));
        sim.stop_at(Time::from_secs(50));
        sim.run();
        assert_eq!(*order.borrow(), vec!["early"]);
        assert_eq!(sim.now(), Time::from_secs(50));
        assert_eq!(sim.pending_events(), 2);
    }

    #[test]
    fn test_stop_at_stays_armed_when_queue_drains() {
        let order = log();
        let mut sim = Simulator::new();
        sim.stop_at(Time::from_secs(10));
        sim.run();
        assert_eq!(sim.now(), Time::ZERO);

        sim.schedule(Time::from_secs(20), push(&order, "after stop"));
        sim.run();
        assert!(order.borrow().is_empty());
        assert_eq!(sim.now(), Time::from_secs(10));
    }

    #[test]
    #[should_panic(expected = "already running")]
    fn test_nested_run_is_fatal() {
        let mut sim = Simulator::new();
        sim.schedule(Time::from_secs(1), |sim| sim.run());
        sim.run();
    }

    #[test]
    fn test_step_dispatches_one_entry() {
        let order = log();
        let mut sim = Simulator::new();
        sim.schedule(Time::from_secs(1), push(&order, "a"));
        sim.schedule(Time::from_secs(2), push(&order, "b"));
        assert!(sim.step());
        assert_eq!(*order.borrow(), vec!["a"]);
        assert_eq!(sim.now(), Time::from_secs(1));
        assert!(sim.step());
        assert!(!sim.step());
        assert_eq!(sim.state(), SimulatorState::Idle);
    }

    #[test]
    fn test_set_scheduler_keeps_pending_events() {
        let order = log();
        let mut sim = Simulator::with_backend(Box::new(HeapScheduler::new()));
        sim.schedule(Time::from_secs(3), push(&order, "c"));
        let id = sim.schedule(Time::from_secs(2), push(&order, "cancelled"));
        sim.schedule(Time::from_secs(1), push(&order, "a"));
        sim.set_scheduler(SchedulerKind::Calendar.create());
        assert_eq!(sim.scheduler_name(), "calendar");
        assert_eq!(sim.pending_events(), 3);
        sim.remove(&id);
        sim.run();
        assert_eq!(*order.borrow(), vec!["a", "c"]);
    }

    #[test]
    fn test_destroy_runs_fifo_and_releases_rest() {
        let order = log();
        let released = Rc::new(());
        let mut sim = Simulator::new();
        sim.schedule_destroy(push(&order, "first"));
        let removed = sim.schedule_destroy(push(&order, "removed"));
        let o = Rc::clone(&order);
        sim.schedule_destroy(move |sim| {
            o.borrow_mut().push("second");
            sim.schedule_destroy(push(&o, "chained"));
        });
        let captured = Rc::clone(&released);
        sim.schedule(Time::from_secs(1), move |_| drop(captured));

        assert!(!sim.is_expired(&removed));
        sim.remove(&removed);
        assert!(sim.is_expired(&removed));
        sim.destroy();
        assert_eq!(*order.borrow(), vec!["first", "second", "chained"]);
        assert_eq!(Rc::strong_count(&released), 1);
    }
}
