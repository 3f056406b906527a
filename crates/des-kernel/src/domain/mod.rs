//! Domain Layer
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Domain Layer                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  Time Module                   Event Module                 │
//! │  ├─ Int64x64 (64.64 fixed)     ├─ EventKey (ts, uid)        │
//! │  ├─ Time                       ├─ EventImpl (callback)      │
//! │  └─ TimeUnit                   └─ EventId (weak handle)     │
//! │                                                             │
//! │  Scheduler Module              Simulator Module             │
//! │  ├─ SchedulerBackend           ├─ Simulator                 │
//! │  ├─ Heap / List / Map          ├─ SimulatorConfig           │
//! │  └─ Calendar                   └─ SimulatorError            │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dependencies only point downwards: `time` ◄── `event` ◄── `scheduler`
//! ◄── `simulator`. The one exception is the callback type, which names
//! [`Simulator`] so events can schedule further events.

pub mod event;
pub mod scheduler;
pub mod simulator;
pub mod time;

pub use event::{Callback, EventId, EventKey, EventKind, ScheduledEvent, NO_CONTEXT};
pub use scheduler::{
    CalendarScheduler, HeapScheduler, ListScheduler, MapScheduler, SchedulerBackend,
    SchedulerKind,
};
pub use simulator::{ConfigError, Simulator, SimulatorConfig, SimulatorError, SimulatorState};
pub use time::{Int64x64, ParseTimeError, ResolutionError, Time, TimeUnit};
