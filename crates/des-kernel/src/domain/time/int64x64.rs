//! Signed 64.64 Fixed-point Number
//!
//! # Representation
//!
//! ```text
//!  127                  64 63                    0
//! ┌──────────────────────┬───────────────────────┐
//! │  high: i64 (integer) │  low: u64 (fraction)  │
//! └──────────────────────┴───────────────────────┘
//!          value = high + low / 2^64
//! ```
//!
//! The whole value lives in a single `i128`, so addition, subtraction and
//! ordering are plain integer operations. Multiplication and division split
//! the magnitudes into 64-bit halves and keep every intermediate bit, rounding
//! only the final bit (to nearest, ties away from zero).
//!
//! Operators panic on overflow and on division by zero, like the primitive
//! integer types. The `checked_*` family reports the same conditions as
//! `None`.

use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use super::decimal::{self, DEFAULT_PRECISION};
use super::error::ParseTimeError;

pub(crate) const FRAC_BITS: u32 = 64;
const LOW_MASK: u128 = u64::MAX as u128;
const HALF_LOW: u128 = 1 << (FRAC_BITS - 1);
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// Signed fixed-point number with 64 integer bits and 64 fractional bits
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Int64x64(i128);

impl Int64x64 {
    /// `0`
    pub const ZERO: Self = Self(0);
    /// `1`
    pub const ONE: Self = Self(1 << FRAC_BITS);
    /// Smallest representable value (`-2^63`)
    pub const MIN: Self = Self(i128::MIN);
    /// Largest representable value (`2^63 - 2^-64`)
    pub const MAX: Self = Self(i128::MAX);
    /// Smallest positive value (`2^-64`)
    pub const EPSILON: Self = Self(1);

    /// Build from the raw two's complement bit pattern
    #[inline(always)]
    pub const fn from_bits(bits: i128) -> Self {
        Self(bits)
    }

    /// Raw two's complement bit pattern
    #[inline(always)]
    pub const fn to_bits(self) -> i128 {
        self.0
    }

    /// Build from an integer part and a fractional part in units of `2^-64`
    ///
    /// The value is `high + low / 2^64`, so `from_parts(-1, 1 << 63)` is `-0.5`.
    #[inline(always)]
    pub const fn from_parts(high: i64, low: u64) -> Self {
        Self(((high as i128) << FRAC_BITS) | low as i128)
    }

    /// Exact conversion from an integer
    #[inline(always)]
    pub const fn from_integer(value: i64) -> Self {
        Self((value as i128) << FRAC_BITS)
    }

    /// Integer part, rounded toward negative infinity
    #[inline(always)]
    pub const fn high(self) -> i64 {
        (self.0 >> FRAC_BITS) as i64
    }

    /// Fractional part in units of `2^-64`, always non-negative
    #[inline(always)]
    pub const fn low(self) -> u64 {
        self.0 as u64
    }

    /// Nearest representable value; NaN maps to zero, infinities saturate
    pub fn from_f64(value: f64) -> Self {
        Self((value * TWO_POW_64) as i128)
    }

    /// Nearest `f64`
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / TWO_POW_64
    }

    /// Integer part, rounded toward zero
    pub const fn trunc(self) -> i64 {
        let integer = (self.0.unsigned_abs() >> FRAC_BITS) as i128;
        if self.0 < 0 {
            -integer as i64
        } else {
            integer as i64
        }
    }

    /// Nearest integer, ties away from zero, saturating at the `i64` range
    pub fn round(self) -> i64 {
        let integer = ((self.0.unsigned_abs() + HALF_LOW) >> FRAC_BITS) as i128;
        let signed = if self.0 < 0 { -integer } else { integer };
        signed.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    /// `true` for values below zero
    #[inline(always)]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `true` for values above zero
    #[inline(always)]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// `true` for exactly zero
    #[inline(always)]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Absolute value, saturating at [`Int64x64::MAX`]
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Sum, `None` on overflow
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Difference, `None` on overflow
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Negation, `None` for [`Int64x64::MIN`]
    pub const fn checked_neg(self) -> Option<Self> {
        match self.0.checked_neg() {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Product rounded to the nearest `2^-64`, `None` on overflow
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        let negative = (self.0 < 0) != (rhs.0 < 0);
        let magnitude = mul_magnitudes(self.0.unsigned_abs(), rhs.0.unsigned_abs())?;
        apply_sign(magnitude, negative)
    }

    /// Quotient rounded to the nearest `2^-64`, `None` on overflow or
    /// division by zero
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.0 == 0 {
            return None;
        }
        let negative = (self.0 < 0) != (rhs.0 < 0);
        let magnitude = div_magnitudes(self.0.unsigned_abs(), rhs.0.unsigned_abs())?;
        apply_sign(magnitude, negative)
    }

    /// Product clamped to [`Int64x64::MIN`] / [`Int64x64::MAX`]
    pub fn saturating_mul(self, rhs: Self) -> Self {
        self.checked_mul(rhs).unwrap_or(if (self.0 < 0) != (rhs.0 < 0) {
            Self::MIN
        } else {
            Self::MAX
        })
    }

    /// Sum clamped to the representable range
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Difference clamped to the representable range
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

fn mul_magnitudes(a: u128, b: u128) -> Option<u128> {
    let (a_high, a_low) = (a >> FRAC_BITS, a & LOW_MASK);
    let (b_high, b_low) = (b >> FRAC_BITS, b & LOW_MASK);

    // Both highs are at most 2^63, so this cannot wrap.
    let high = a_high * b_high;
    if high > LOW_MASK {
        return None;
    }
    // Only the low*low term carries bits below 2^-64.
    let low = (a_low * b_low + HALF_LOW) >> FRAC_BITS;

    (high << FRAC_BITS)
        .checked_add(a_high * b_low)?
        .checked_add(a_low * b_high)?
        .checked_add(low)
}

fn div_magnitudes(dividend: u128, divisor: u128) -> Option<u128> {
    let integer = dividend / divisor;
    if integer > LOW_MASK {
        return None;
    }

    // remainder < divisor <= 2^127, so doubling it never wraps.
    let mut remainder = dividend % divisor;
    let mut fraction: u128 = 0;
    for _ in 0..FRAC_BITS {
        remainder <<= 1;
        fraction <<= 1;
        if remainder >= divisor {
            remainder -= divisor;
            fraction |= 1;
        }
    }
    let round_up = remainder >= divisor - remainder;

    ((integer << FRAC_BITS) | fraction).checked_add(u128::from(round_up))
}

fn apply_sign(magnitude: u128, negative: bool) -> Option<Int64x64> {
    if negative {
        // 2^127 maps onto i128::MIN through the wrapping negation.
        (magnitude <= 1 << 127).then(|| Int64x64((magnitude as i128).wrapping_neg()))
    } else {
        i128::try_from(magnitude).ok().map(Int64x64)
    }
}

#[cold]
#[inline(never)]
fn overflow(operation: &str) -> ! {
    panic!("Int64x64 {operation} overflowed")
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Operators
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl Add for Int64x64 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.checked_add(rhs).unwrap_or_else(|| overflow("addition"))
    }
}

impl Sub for Int64x64 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.checked_sub(rhs).unwrap_or_else(|| overflow("subtraction"))
    }
}

impl Mul for Int64x64 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.checked_mul(rhs).unwrap_or_else(|| overflow("multiplication"))
    }
}

impl Div for Int64x64 {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        if rhs.is_zero() {
            panic!("attempt to divide Int64x64 by zero");
        }
        self.checked_div(rhs).unwrap_or_else(|| overflow("division"))
    }
}

impl Neg for Int64x64 {
    type Output = Self;

    fn neg(self) -> Self {
        self.checked_neg().unwrap_or_else(|| overflow("negation"))
    }
}

impl AddAssign for Int64x64 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Int64x64 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for Int64x64 {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl DivAssign for Int64x64 {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl From<i64> for Int64x64 {
    fn from(value: i64) -> Self {
        Self::from_integer(value)
    }
}

impl From<i32> for Int64x64 {
    fn from(value: i32) -> Self {
        Self::from_integer(i64::from(value))
    }
}

impl From<u32> for Int64x64 {
    fn from(value: u32) -> Self {
        Self::from_integer(i64::from(value))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Text conversion
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Decimal rendering with an explicit sign
///
/// The formatter precision selects the number of fractional digits
/// (`format!("{:.9}", x)`); without one all 20 significant digits are
/// printed. The last digit is rounded half to even.
impl fmt::Display for Int64x64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(DEFAULT_PRECISION);
        f.write_str(&decimal::format(self.0, precision))
    }
}

impl fmt::Debug for Int64x64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Int64x64({self})")
    }
}

impl FromStr for Int64x64 {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decimal::parse(s).map(Self)
    }
}
