//! Scheduler Module - Pluggable Ordered Event Sets
//!
//! # Module Structure
//!
//! ```text
//! domain/scheduler/
//! ├── backend.rs           SchedulerBackend trait (+ shared contract test)
//! ├── heap_backend.rs      HeapScheduler      binary min-heap
//! ├── list_backend.rs      ListScheduler      sorted sequence
//! ├── map_backend.rs       MapScheduler       BTreeMap by (timestamp, uid)
//! ├── calendar_backend.rs  CalendarScheduler  calendar queue
//! └── types.rs             SchedulerKind      name → backend factory
//! ```
//!
//! # Cross-backend Law
//!
//! For an identical sequence of insert/remove calls every backend yields
//! events in exactly the same order: ascending timestamp, then ascending uid.
//! The simulator's determinism rests on this, and the integration tests check
//! it by running one workload on all four backends and diffing the traces.

mod backend;
mod calendar_backend;
mod heap_backend;
mod list_backend;
mod map_backend;
mod types;

pub use backend::SchedulerBackend;
pub use calendar_backend::CalendarScheduler;
pub use heap_backend::HeapScheduler;
pub use list_backend::ListScheduler;
pub use map_backend::MapScheduler;
pub use types::SchedulerKind;
