//! Time Module - 64.64 Fixed-point Simulation Time
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Time (resolution units) TimeUnit            │
//! │    └─ Int64x64  ◄──────  d h min s ms ...   │
//! │         └─ i128 (high.low)                   │
//! │                                              │
//! │  decimal: "+1.50000000000000000000" ⇄ bits   │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Laws
//! - Ordering of [`Time`] is the ordering of the underlying `i128`, so
//!   timestamps compare exactly and deterministically.
//! - A [`Time`] is always a whole number of resolution units, so sums of
//!   unit-built delays are exact.
//! - `parse(format(x)) == x` for every value at the default 20-digit precision.
//! - Decimal output rounds half to even on the last printed digit.

mod decimal;
mod error;
mod int64x64;
mod types;

pub use decimal::DEFAULT_PRECISION;
pub use error::{ParseTimeError, ResolutionError};
pub use int64x64::Int64x64;
pub use types::{Time, TimeDisplay, TimeUnit};
