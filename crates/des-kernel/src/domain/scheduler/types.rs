//! Scheduler Types
//!
//! [`SchedulerKind`] names a backend so it can be picked from configuration
//! text (`DES_SCHEDULER=calendar`, `--scheduler map`) and built at runtime.

use std::fmt;
use std::str::FromStr;

use crate::domain::simulator::ConfigError;

use super::backend::SchedulerBackend;
use super::calendar_backend::CalendarScheduler;
use super::heap_backend::HeapScheduler;
use super::list_backend::ListScheduler;
use super::map_backend::MapScheduler;

/// Available scheduler backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SchedulerKind {
    /// Binary heap: general-purpose default
    #[default]
    Heap,
    /// Sorted list: O(1) pop, O(n) insert
    List,
    /// Ordered map: O(log n) everything, cheap arbitrary removal
    Map,
    /// Calendar queue: O(1) amortized for evenly spread timestamps
    Calendar,
}

impl SchedulerKind {
    /// Every backend, in declaration order
    pub const ALL: [SchedulerKind; 4] = [Self::Heap, Self::List, Self::Map, Self::Calendar];

    /// Build an empty backend of this kind
    pub fn create(self) -> Box<dyn SchedulerBackend> {
        match self {
            Self::Heap => Box::new(HeapScheduler::new()),
            Self::List => Box::new(ListScheduler::new()),
            Self::Map => Box::new(MapScheduler::new()),
            Self::Calendar => Box::new(CalendarScheduler::new()),
        }
    }

    /// Lowercase name, identical to the backend's `name()`
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Heap => "heap",
            Self::List => "list",
            Self::Map => "map",
            Self::Calendar => "calendar",
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heap" => Ok(Self::Heap),
            "list" => Ok(Self::List),
            "map" => Ok(Self::Map),
            "calendar" => Ok(Self::Calendar),
            _ => Err(ConfigError::UnknownScheduler(s.to_string())),
        }
    }
}
