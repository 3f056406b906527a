//! Time parsing errors
//!
//! Unlike the scheduling invariants, malformed time text is an ordinary
//! runtime condition (it usually comes from a config file or the command
//! line), so it is reported as a value instead of aborting.

use super::types::TimeUnit;

/// Failure to parse a decimal fixed-point number or a time string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseTimeError {
    /// Input was empty or contained only a sign / decimal point
    #[error("cannot parse time from empty string")]
    Empty,

    /// A character that is not a decimal digit was found
    #[error("invalid character {found:?} at position {position}")]
    InvalidDigit {
        /// Offending character
        found: char,
        /// Character index inside the trimmed input
        position: usize,
    },

    /// Value does not fit in a signed 64.64 fixed-point number
    #[error("value out of range for 64.64 fixed point")]
    Overflow,

    /// Unit suffix is not one of `d h min s ms us ns ps fs`
    #[error("unknown time unit {0:?}")]
    UnknownUnit(String),
}

/// [`Time::set_resolution`](super::Time::set_resolution) after the
/// resolution was already fixed to another unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("time resolution is already {current}, cannot switch to {requested}")]
pub struct ResolutionError {
    /// Resolution in effect
    pub current: TimeUnit,
    /// Resolution that was asked for
    pub requested: TimeUnit,
}
