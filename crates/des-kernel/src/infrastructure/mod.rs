//! Infrastructure Layer
//!
//! Pieces that touch threads and synchronisation primitives rather than pure
//! simulation state.
//!
//! - [`injector`]: thread-safe event injection into a running simulator

pub mod injector;

pub use injector::RemoteScheduler;
