//! Simulator Configuration
//!
//! ```text
//!   DES_SCHEDULER   heap | list | map | calendar     (default heap)
//!   DES_RESOLUTION  s | ms | us | ns | ps | fs       (default ns)
//! ```
//!
//! The resolution is the unit every [`Time`](crate::Time) counts in. It is
//! process-wide: building a simulator applies it, and once any time has been
//! built the process stays at that unit.

use crate::domain::scheduler::SchedulerKind;
use crate::domain::time::TimeUnit;

use super::error::ConfigError;

/// Environment variable selecting the scheduler backend
pub const SCHEDULER_ENV: &str = "DES_SCHEDULER";

/// Environment variable selecting the time resolution
pub const RESOLUTION_ENV: &str = "DES_RESOLUTION";

/// How a [`Simulator`](super::Simulator) is assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulatorConfig {
    /// Backend holding pending events
    pub scheduler: SchedulerKind,
    /// Smallest representable time step
    pub resolution: TimeUnit,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerKind::Heap,
            resolution: TimeUnit::Ns,
        }
    }
}

impl SimulatorConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another backend
    pub fn with_scheduler(mut self, scheduler: SchedulerKind) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Use another time resolution
    pub fn with_resolution(mut self, resolution: TimeUnit) -> Self {
        self.resolution = resolution;
        self
    }

    /// Defaults overridden by `DES_SCHEDULER` / `DES_RESOLUTION`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the two variables
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(SCHEDULER_ENV) {
            config.scheduler = value.parse()?;
        }
        if let Some(value) = lookup(RESOLUTION_ENV) {
            config.resolution = value
                .parse()
                .map_err(|_| ConfigError::UnknownUnit(value.clone()))?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SimulatorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SimulatorConfig::default());
        assert_eq!(config.scheduler, SchedulerKind::Heap);
        assert_eq!(config.resolution, TimeUnit::Ns);
    }

    #[test]
    fn test_overrides() {
        let config =
            SimulatorConfig::from_lookup(lookup(&[("DES_SCHEDULER", "calendar"), ("DES_RESOLUTION", "ps")]))
                .unwrap();
        assert_eq!(config.scheduler, SchedulerKind::Calendar);
        assert_eq!(config.resolution, TimeUnit::Ps);
    }

    #[test]
    fn test_bad_values_are_reported() {
        assert_eq!(
            SimulatorConfig::from_lookup(lookup(&[("DES_SCHEDULER", "fifo")])),
            Err(ConfigError::UnknownScheduler("fifo".into()))
        );
        assert_eq!(
            SimulatorConfig::from_lookup(lookup(&[("DES_RESOLUTION", "jiffy")])),
            Err(ConfigError::UnknownUnit("jiffy".into()))
        );
    }

    #[test]
    fn test_builder() {
        let config = SimulatorConfig::new()
            .with_scheduler(SchedulerKind::Map)
            .with_resolution(TimeUnit::Us);
        assert_eq!(config.scheduler, SchedulerKind::Map);
        assert_eq!(config.resolution, TimeUnit::Us);
    }
}
