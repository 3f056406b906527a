//! Simulator Error Types
//!
//! Two families:
//!
//! - [`SimulatorError`]: broken scheduling invariants (causality, stale or
//!   double removal, re-entrant run). These are programming errors. The
//!   panicking API reports them through [`fatal`], which logs the offending
//!   operation and its arguments before aborting the run; the `try_*` API
//!   returns them instead.
//! - [`ConfigError`]: unrecognised configuration text, or a resolution that
//!   conflicts with the one already in effect. Always recoverable.

use crate::domain::time::{ResolutionError, Time};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Simulator Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Violation of a scheduling invariant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulatorError {
    /// An event would fire before the current time
    #[error("{operation}: requested time {requested} is before the current time {now}")]
    CausalityViolation {
        /// Offending call
        operation: &'static str,
        /// Absolute time that was requested
        requested: Time,
        /// Simulator clock at the time of the call
        now: Time,
    },

    /// A delay handed to a thread-safe scheduling call was negative
    #[error("{operation}: negative delay {delay}")]
    NegativeDelay {
        /// Offending call
        operation: &'static str,
        /// The delay that was passed
        delay: Time,
    },

    /// The handle does not refer to a pending event (already run, removed or
    /// released)
    #[error("{operation}: event {uid} is not pending")]
    EventNotPending {
        /// Offending call
        operation: &'static str,
        /// Uid of the handle
        uid: u64,
    },

    /// The null handle was passed where a live event is required
    #[error("{operation}: null event handle")]
    NullEvent {
        /// Offending call
        operation: &'static str,
    },

    /// `run()` or `step()` was called from inside an event
    #[error("run() called while the simulator is already running")]
    ReentrantRun,

    /// `now + delay` does not fit in the time range
    #[error("current time {now} plus delay {delay} exceeds the simulated time range")]
    TimeOverflow {
        /// Simulator clock at the time of the call
        now: Time,
        /// The delay that was passed
        delay: Time,
    },

    /// An event callback was invoked a second time
    #[error("event invoked twice")]
    AlreadyInvoked,
}

/// Log `error` and abort the current simulation by panicking
#[cold]
#[track_caller]
pub(crate) fn fatal(error: SimulatorError) -> ! {
    tracing::error!(%error, "fatal simulator error");
    panic!("{error}")
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Configuration Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Unrecognised configuration value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Scheduler name other than `heap`, `list`, `map`, `calendar`
    #[error("unknown scheduler {0:?} (expected heap, list, map or calendar)")]
    UnknownScheduler(String),

    /// Time unit other than `d`, `h`, `min`, `s`, `ms`, `us`, `ns`, `ps`, `fs`
    #[error("unknown time unit {0:?}")]
    UnknownUnit(String),

    /// The process already runs at another time resolution
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}
