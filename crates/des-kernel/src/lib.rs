//! Discrete-event Simulation Kernel
//!
//! # Overview
//!
//! `des-kernel` runs callbacks at simulated instants, strictly in
//! `(timestamp, uid)` order, on a single thread. Time is a whole number of
//! resolution units (nanoseconds unless configured otherwise), so sums of
//! delays never drift and chained delays tie with direct ones.
//!
//! # Layers
//!
//! - **Domain**: time arithmetic, events, scheduler backends and the event loop
//! - **Infrastructure**: thread-safe injection of events from other threads
//!
//! # Guarantees
//!
//! ## Ordering
//! - Events run in increasing timestamp order; ties run in scheduling order.
//! - The clock never decreases.
//!
//! ## Causality
//! - Scheduling before the current time is rejected.
//! - `run()` cannot be entered from inside an event.
//!
//! ## Cancellation
//! - A cancelled event never runs and its captured state is released at once.
//! - Handles never dangle: a handle to a finished event is simply expired.
//!
//! # Usage
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use des_kernel::{SchedulerKind, Simulator, SimulatorConfig, Time};
//!
//! let config = SimulatorConfig::new().with_scheduler(SchedulerKind::Calendar);
//! let mut sim = Simulator::with_config(config);
//!
//! let fired = Rc::new(Cell::new(0));
//! let f = Rc::clone(&fired);
//! sim.schedule(Time::from_secs(1), move |sim| {
//!     f.set(f.get() + 1);
//!     let f = Rc::clone(&f);
//!     sim.schedule(Time::from_millis(500), move |_| f.set(f.get() + 1));
//! });
//! let dropped = sim.schedule(Time::from_secs(5), |_| unreachable!());
//! sim.cancel(&dropped);
//!
//! sim.run();
//! assert_eq!(fired.get(), 2);
//! assert_eq!(sim.now(), Time::from_secs(5));
//! sim.destroy();
//! ```
//!
//! # Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` for `Time`, `Int64x64`, `TimeUnit`,
//!   `SchedulerKind` and `SimulatorConfig`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod infrastructure;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Re-export Primary Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

// Time types
pub use domain::{Int64x64, ParseTimeError, ResolutionError, Time, TimeUnit};

// Event types
pub use domain::{Callback, EventId, EventKey, EventKind, ScheduledEvent, NO_CONTEXT};

// Scheduler types
pub use domain::{
    CalendarScheduler, HeapScheduler, ListScheduler, MapScheduler, SchedulerBackend,
    SchedulerKind,
};

// Simulator types
pub use domain::{ConfigError, Simulator, SimulatorConfig, SimulatorError, SimulatorState};
pub use infrastructure::RemoteScheduler;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
