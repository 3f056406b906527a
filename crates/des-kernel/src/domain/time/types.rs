//! Simulation Time Types
//!
//! [`Time`] counts whole units of a process-wide resolution (nanoseconds by
//! default), held in a 64.64 fixed-point number whose fraction stays zero.
//! Building a time from a unit at or above the resolution is an integer
//! multiply, so `2ms + 4ms == 6ms` exactly and events reached by chaining
//! delays tie with events scheduled directly. [`Int64x64`] only carries the
//! conversions to other units and to decimal text.
//!
//! ```text
//!   resolution   range          resolution   range
//!   s            ±292e9 years   ns           ±292 years
//!   ms           ±292e6 years   ps           ±106 days
//!   us           ±292e3 years   fs           ±2.5 hours
//! ```

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use super::error::{ParseTimeError, ResolutionError};
use super::int64x64::Int64x64;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TimeUnit
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Unit of simulated time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TimeUnit {
    /// Day (86 400 s)
    D,
    /// Hour
    H,
    /// Minute
    Min,
    /// Second
    S,
    /// Millisecond
    Ms,
    /// Microsecond
    Us,
    /// Nanosecond
    Ns,
    /// Picosecond
    Ps,
    /// Femtosecond
    Fs,
}

impl TimeUnit {
    /// Every unit, largest first
    pub const ALL: [TimeUnit; 9] = [
        Self::D,
        Self::H,
        Self::Min,
        Self::S,
        Self::Ms,
        Self::Us,
        Self::Ns,
        Self::Ps,
        Self::Fs,
    ];

    /// Length of one unit in femtoseconds
    const fn femtos(self) -> i128 {
        match self {
            Self::D => 86_400 * 1_000_000_000_000_000,
            Self::H => 3_600 * 1_000_000_000_000_000,
            Self::Min => 60 * 1_000_000_000_000_000,
            Self::S => 1_000_000_000_000_000,
            Self::Ms => 1_000_000_000_000,
            Self::Us => 1_000_000_000,
            Self::Ns => 1_000_000,
            Self::Ps => 1_000,
            Self::Fs => 1,
        }
    }

    /// Fractional second digits needed to show this resolution
    ///
    /// `Us → 6`, `Ns → 9`, `Ps → 12`, `Fs → 15`; units of a second or more
    /// print no fraction.
    pub const fn digits(self) -> usize {
        match self {
            Self::D | Self::H | Self::Min | Self::S => 0,
            Self::Ms => 3,
            Self::Us => 6,
            Self::Ns => 9,
            Self::Ps => 12,
            Self::Fs => 15,
        }
    }

    /// Length of one unit
    pub fn duration(self) -> Time {
        Time::from_unit(1, self)
    }

    /// Canonical suffix (`"ms"`, `"us"`, ...)
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::D => "d",
            Self::H => "h",
            Self::Min => "min",
            Self::S => "s",
            Self::Ms => "ms",
            Self::Us => "us",
            Self::Ns => "ns",
            Self::Ps => "ps",
            Self::Fs => "fs",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for TimeUnit {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" => Ok(Self::D),
            "h" => Ok(Self::H),
            "min" => Ok(Self::Min),
            "s" => Ok(Self::S),
            "ms" => Ok(Self::Ms),
            "us" | "µs" => Ok(Self::Us),
            "ns" => Ok(Self::Ns),
            "ps" => Ok(Self::Ps),
            "fs" => Ok(Self::Fs),
            _ => Err(ParseTimeError::UnknownUnit(s.to_string())),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Resolution
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Set once the resolution has been read or chosen
const FROZEN: u8 = 0x80;

/// Index into [`TimeUnit::ALL`], plus the [`FROZEN`] bit
static RESOLUTION: AtomicU8 = AtomicU8::new(TimeUnit::Ns as u8);

fn decode(state: u8) -> TimeUnit {
    TimeUnit::ALL[usize::from(state & !FROZEN)]
}

/// How many `to` units one `from` unit holds, or the reverse
#[derive(Debug, Clone, Copy)]
enum Ratio {
    Mul(i128),
    Div(i128),
}

fn ratio(from: TimeUnit, to: TimeUnit) -> Ratio {
    let (from, to) = (from.femtos(), to.femtos());
    if from >= to {
        Ratio::Mul(from / to)
    } else {
        Ratio::Div(to / from)
    }
}

/// `factor` as two `i64` steps; only days against femtoseconds needs both
fn steps(factor: i128) -> [i64; 2] {
    match i64::try_from(factor) {
        Ok(factor) => [factor, 1],
        Err(_) => [(factor / 1_000) as i64, 1_000],
    }
}

/// Integer rescale, ties away from zero, `None` past the `i128` range
fn scale_integer(value: i128, ratio: Ratio) -> Option<i128> {
    match ratio {
        Ratio::Mul(factor) => value.checked_mul(factor),
        Ratio::Div(divisor) => {
            let (quotient, remainder) = (value / divisor, value % divisor);
            if remainder.unsigned_abs() * 2 >= divisor.unsigned_abs() {
                Some(quotient + value.signum())
            } else {
                Some(quotient)
            }
        }
    }
}

fn scale_fixed(value: Int64x64, ratio: Ratio) -> Option<Int64x64> {
    let mut scaled = value;
    match ratio {
        Ratio::Mul(factor) => {
            for step in steps(factor) {
                scaled = scaled.checked_mul(Int64x64::from_integer(step))?;
            }
        }
        Ratio::Div(divisor) => {
            for step in steps(divisor) {
                scaled = scaled.checked_div(Int64x64::from_integer(step))?;
            }
        }
    }
    Some(scaled)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Time
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Point in (or span of) simulated time, in whole resolution units
///
/// Used both as an absolute timestamp and as a delay; the simulator rejects
/// negative delays, not this type.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Time(Int64x64);

impl Time {
    /// Simulation origin
    pub const ZERO: Self = Self(Int64x64::ZERO);
    /// Latest representable instant
    pub const MAX: Self = Self(Int64x64::from_integer(i64::MAX));
    /// Earliest representable instant
    pub const MIN: Self = Self(Int64x64::from_integer(i64::MIN));

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Resolution
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Unit counted by every [`Time`] in this process
    ///
    /// Reading it fixes it: once any time has been built from or converted to
    /// a unit, [`Time::set_resolution`] only accepts the same unit.
    pub fn resolution() -> TimeUnit {
        let mut state = RESOLUTION.load(Ordering::Acquire);
        if state & FROZEN == 0 {
            state = RESOLUTION.fetch_or(FROZEN, Ordering::AcqRel);
        }
        decode(state)
    }

    /// Choose the resolution for the rest of the process
    ///
    /// Succeeds before the first unit conversion, and afterwards only when
    /// `unit` is already the resolution.
    pub fn set_resolution(unit: TimeUnit) -> Result<(), ResolutionError> {
        loop {
            let state = RESOLUTION.load(Ordering::Acquire);
            if state & FROZEN != 0 {
                let current = decode(state);
                return if current == unit {
                    Ok(())
                } else {
                    Err(ResolutionError { current, requested: unit })
                };
            }
            if RESOLUTION
                .compare_exchange(state, unit as u8 | FROZEN, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                tracing::debug!(resolution = %unit, "time resolution set");
                return Ok(());
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Construction
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Exactly `ticks` resolution units
    #[inline(always)]
    pub const fn from_ticks(ticks: i64) -> Self {
        Self(Int64x64::from_integer(ticks))
    }

    /// Count of resolution units
    #[inline(always)]
    pub const fn ticks(self) -> i64 {
        self.0.high()
    }

    /// `units` resolution units, rounded to the nearest whole unit
    pub fn new(units: Int64x64) -> Self {
        Self::from_ticks(units.round())
    }

    /// Count of resolution units as a fixed-point number
    #[inline(always)]
    pub const fn as_int64x64(self) -> Int64x64 {
        self.0
    }

    /// `value` units, `None` when out of range
    ///
    /// Units at or above the resolution convert by an exact integer multiply.
    /// Finer units round to the nearest resolution unit, ties away from zero.
    pub fn checked_from_unit(value: i64, unit: TimeUnit) -> Option<Self> {
        let ticks = scale_integer(i128::from(value), ratio(unit, Self::resolution()))?;
        i64::try_from(ticks).ok().map(Self::from_ticks)
    }

    /// `value` units
    ///
    /// # Panics
    /// When the result does not fit in the resolution's range.
    pub fn from_unit(value: i64, unit: TimeUnit) -> Self {
        Self::checked_from_unit(value, unit)
            .unwrap_or_else(|| panic!("{value}{unit} is outside the simulated time range"))
    }

    /// Fixed-point `value` units, rounded to the nearest resolution unit
    pub fn checked_from_fixed(value: Int64x64, unit: TimeUnit) -> Option<Self> {
        scale_fixed(value, ratio(unit, Self::resolution())).map(Self::new)
    }

    /// Whole seconds
    pub fn from_secs(secs: i64) -> Self {
        Self::from_unit(secs, TimeUnit::S)
    }

    /// Milliseconds
    pub fn from_millis(ms: i64) -> Self {
        Self::from_unit(ms, TimeUnit::Ms)
    }

    /// Microseconds
    pub fn from_micros(us: i64) -> Self {
        Self::from_unit(us, TimeUnit::Us)
    }

    /// Nanoseconds
    pub fn from_nanos(ns: i64) -> Self {
        Self::from_unit(ns, TimeUnit::Ns)
    }

    /// Picoseconds
    pub fn from_picos(ps: i64) -> Self {
        Self::from_unit(ps, TimeUnit::Ps)
    }

    /// Femtoseconds
    pub fn from_femtos(fs: i64) -> Self {
        Self::from_unit(fs, TimeUnit::Fs)
    }

    /// Fractional seconds, rounded to the nearest resolution unit and
    /// clamped to [`Time::MIN`] / [`Time::MAX`]
    pub fn from_secs_f64(secs: f64) -> Self {
        Self::checked_from_fixed(Int64x64::from_f64(secs), TimeUnit::S)
            .unwrap_or(if secs < 0.0 { Self::MIN } else { Self::MAX })
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Conversion
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Fractional seconds
    pub fn as_secs_f64(self) -> f64 {
        self.to_unit(TimeUnit::S).to_f64()
    }

    /// This time counted in `unit`, saturating at the fixed-point range
    pub fn to_unit(self, unit: TimeUnit) -> Int64x64 {
        scale_fixed(self.0, ratio(Self::resolution(), unit)).unwrap_or(if self.is_negative() {
            Int64x64::MIN
        } else {
            Int64x64::MAX
        })
    }

    /// This time counted in `unit`, rounded to the nearest integer and
    /// saturating at the `i64` range
    pub fn to_integer(self, unit: TimeUnit) -> i64 {
        let saturated = if self.is_negative() { i64::MIN } else { i64::MAX };
        scale_integer(i128::from(self.ticks()), ratio(Self::resolution(), unit))
            .and_then(|value| i64::try_from(value).ok())
            .unwrap_or(saturated)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Arithmetic
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Sum, `None` on overflow
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Difference, `None` on overflow
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Sum clamped to [`Time::MIN`] / [`Time::MAX`]
    pub fn saturating_add(self, rhs: Self) -> Self {
        self.checked_add(rhs)
            .unwrap_or(if rhs.is_negative() { Self::MIN } else { Self::MAX })
    }

    /// `true` before the simulation origin
    #[inline(always)]
    pub const fn is_negative(self) -> bool {
        self.0.is_negative()
    }

    /// `true` after the simulation origin
    #[inline(always)]
    pub const fn is_positive(self) -> bool {
        self.0.is_positive()
    }

    /// `true` at the simulation origin
    #[inline(always)]
    pub const fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Display adapter printing seconds at the digit count of `resolution`
    ///
    /// ```
    /// use des_kernel::{Time, TimeUnit};
    ///
    /// let t = Time::from_micros(1_600);
    /// assert_eq!(t.display(TimeUnit::Us).to_string(), "+0.001600s");
    /// assert_eq!(t.display(TimeUnit::Ms).to_string(), "+0.002s");
    /// ```
    pub fn display(self, resolution: TimeUnit) -> TimeDisplay {
        TimeDisplay {
            time: self,
            digits: resolution.digits(),
        }
    }
}

impl Add for Time {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Time {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Time {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul<i64> for Time {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self {
        Self(self.0 * Int64x64::from_integer(rhs))
    }
}

impl AddAssign for Time {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Time {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl From<Int64x64> for Time {
    fn from(units: Int64x64) -> Self {
        Self::new(units)
    }
}

/// Seconds with the resolution's digit count unless a precision is given:
/// at nanosecond resolution `format!("{}", t) == "+1.500000000s"`, and
/// `format!("{:.3}", t) == "+1.500s"`
impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = f.precision().unwrap_or(Self::resolution().digits());
        write!(f, "{:.*}s", digits, self.to_unit(TimeUnit::S))
    }
}

impl fmt::Debug for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Time({}{})", self.ticks(), Self::resolution())
    }
}

/// `"<number>[unit]"`; a bare number is read as seconds
impl FromStr for Time {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_alphabetic())
            .last()
            .map_or(trimmed.len(), |(i, _)| i);
        let (number, suffix) = trimmed.split_at(split);
        let unit = if suffix.is_empty() {
            TimeUnit::S
        } else {
            suffix.parse()?
        };

        let value: Int64x64 = number.parse()?;
        Self::checked_from_fixed(value, unit).ok_or(ParseTimeError::Overflow)
    }
}

/// Output of [`Time::display`]
#[derive(Debug, Clone, Copy)]
pub struct TimeDisplay {
    time: Time,
    digits: usize,
}

impl fmt::Display for TimeDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", self.digits, self.time)
    }
}
