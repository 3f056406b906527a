//! Event Types
//!
//! # Ownership
//!
//! ```text
//!   SchedulerBackend ──Rc──► EventImpl ◄──Weak── EventId (caller)
//!   (only strong ref)        callback             uid, timestamp
//!                            cancelled
//! ```
//!
//! The backend entry holds the only strong reference. Once the event has been
//! dispatched, removed or drained, the `EventImpl` is freed and every handle
//! pointing at it simply fails to upgrade, so cancelling a stale handle is a
//! harmless no-op instead of a dangling access.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use crate::domain::simulator::{fatal, Simulator, SimulatorError};
use crate::domain::time::Time;

/// Deferred work run by the simulator
pub type Callback = Box<dyn FnOnce(&mut Simulator)>;

/// Context value of events scheduled without one
pub const NO_CONTEXT: u32 = 0xffff_ffff;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// EventKey
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Total order of pending events
///
/// Timestamp first, then `uid`. The uid counter only grows, so events sharing
/// a timestamp run in the order they were scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    /// When the event fires
    pub timestamp: Time,
    /// Scheduling sequence number, unique per simulator
    pub uid: u64,
}

impl EventKey {
    /// Create a key
    #[inline(always)]
    pub const fn new(timestamp: Time, uid: u64) -> Self {
        Self { timestamp, uid }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// EventImpl
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Callback plus cancellation flag
///
/// The callback is taken out on the first invocation, so a second invocation
/// is detected and reported as a fatal error.
pub struct EventImpl {
    callback: RefCell<Option<Callback>>,
    cancelled: Cell<bool>,
    context: u32,
}

impl EventImpl {
    pub(crate) fn new(context: u32, callback: Callback) -> Self {
        Self {
            callback: RefCell::new(Some(callback)),
            cancelled: Cell::new(false),
            context,
        }
    }

    /// Mark cancelled and release the captured state. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.set(true);
        let released = self.callback.borrow_mut().take();
        drop(released);
    }

    /// Whether [`EventImpl::cancel`] was called
    #[inline(always)]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Context the event was scheduled with
    #[inline(always)]
    pub fn context(&self) -> u32 {
        self.context
    }

    /// Run the callback unless cancelled
    ///
    /// # Panics
    /// When called a second time on an event that was not cancelled.
    pub(crate) fn invoke(&self, simulator: &mut Simulator) {
        if self.is_cancelled() {
            return;
        }
        // borrow released before the callback runs; it may cancel handles
        let callback = self.callback.borrow_mut().take();
        match callback {
            Some(callback) => callback(simulator),
            None => fatal(SimulatorError::AlreadyInvoked),
        }
    }
}

impl fmt::Debug for EventImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventImpl")
            .field("cancelled", &self.cancelled.get())
            .field("context", &self.context)
            .field("armed", &self.callback.borrow().is_some())
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ScheduledEvent
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One backend entry: the key and the owning reference to the event
#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    /// Ordering key
    pub key: EventKey,
    /// The event itself (the only strong reference while queued)
    pub event: Rc<EventImpl>,
}

impl ScheduledEvent {
    /// Pair a key with an event
    pub fn new(key: EventKey, event: Rc<EventImpl>) -> Self {
        Self { key, event }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// EventId
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Which queue an event lives in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Handle not bound to any event
    #[default]
    Null,
    /// Queued in the scheduler backend
    Timed,
    /// Queued for [`Simulator::destroy`]
    Destroy,
}

/// Handle to a scheduled event
///
/// Never owns the event. Cloning is cheap and a handle may outlive its event;
/// `EventId::default()` is the null handle.
#[derive(Debug, Clone, Default)]
pub struct EventId {
    event: Weak<EventImpl>,
    timestamp: Time,
    uid: u64,
    context: u32,
    kind: EventKind,
}

impl EventId {
    pub(crate) fn new(event: &Rc<EventImpl>, key: EventKey, kind: EventKind) -> Self {
        Self {
            event: Rc::downgrade(event),
            timestamp: key.timestamp,
            uid: key.uid,
            context: event.context(),
            kind,
        }
    }

    /// Null handle (same as `Default`)
    pub fn null() -> Self {
        Self::default()
    }

    /// Scheduling sequence number
    #[inline(always)]
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Time the event fires at (zero for destroy events)
    #[inline(always)]
    pub fn timestamp(&self) -> Time {
        self.timestamp
    }

    /// Context the event was scheduled with
    #[inline(always)]
    pub fn context(&self) -> u32 {
        self.context
    }

    /// Queue the event belongs to
    #[inline(always)]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// `true` for the null handle
    pub fn is_null(&self) -> bool {
        self.kind == EventKind::Null
    }

    /// Cancel the event if it is still alive; a no-op otherwise
    ///
    /// Works without access to the simulator, e.g. from a model that only
    /// kept the handle.
    pub fn cancel(&self) {
        if let Some(event) = self.event.upgrade() {
            event.cancel();
        }
    }

    /// `true` for null handles and events that were cancelled or released
    ///
    /// An event that is currently executing still has a live `EventImpl`;
    /// [`Simulator::is_expired`] also covers that case.
    pub fn is_expired(&self) -> bool {
        match self.event.upgrade() {
            Some(event) => event.is_cancelled(),
            None => true,
        }
    }

    pub(crate) fn key(&self) -> EventKey {
        EventKey::new(self.timestamp, self.uid)
    }

    pub(crate) fn upgrade(&self) -> Option<Rc<EventImpl>> {
        self.event.upgrade()
    }
}

impl PartialEq for EventId {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.uid == other.uid
            && self.timestamp == other.timestamp
            && self.context == other.context
            && Weak::ptr_eq(&self.event, &other.event)
    }
}

impl Eq for EventId {}

impl Hash for EventId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.uid.hash(state);
        self.timestamp.hash(state);
        self.context.hash(state);
    }
}
