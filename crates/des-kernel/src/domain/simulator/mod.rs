//! Simulator Module
//!
//! The event loop ([`Simulator`]), its configuration and its error types.

mod config;
mod engine;
mod error;

pub use config::{SimulatorConfig, RESOLUTION_ENV, SCHEDULER_ENV};
pub use engine::{Simulator, SimulatorState};
pub use error::{ConfigError, SimulatorError};

pub(crate) use error::fatal;
