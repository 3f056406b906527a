//! Event Module - Deferred Work and Cancellation Handles
//!
//! - [`EventKey`]: `(timestamp, uid)`, the total order of the event set
//! - [`EventImpl`]: callback + cancelled flag, owned by one backend entry
//! - [`ScheduledEvent`]: what a scheduler backend stores
//! - [`EventId`]: non-owning handle returned to callers

mod types;

pub use types::{
    Callback,
    EventId,
    EventImpl,
    EventKey,
    EventKind,
    ScheduledEvent,
    NO_CONTEXT,
};
