//! Decimal text conversion for 64.64 fixed-point values
//!
//! # Formatting
//!
//! ```text
//!   sign   integer   '.'   fractional digits (precision)   [peek digit]
//!   '+'    "12"      '.'   "50000000000000000000"           → rounding
//! ```
//!
//! Fractional digits are produced by repeatedly multiplying the 64-bit
//! fraction by ten. One extra digit is peeked to round the last printed digit
//! half to even, and a carry ripples through the emitted digits into the
//! integer part (`+9.99999` at 4 digits prints `+10.0000`).
//!
//! # Parsing
//!
//! `[ws] [+|-] digits [. digits] [ws]`. The fractional digits `d1..dn` are
//! read as the exact rational `N / 10^n` and converted to the nearest
//! multiple of `2^-64` by long division, so any value printed with the
//! default 20 digits parses back to the identical bit pattern.

use super::error::ParseTimeError;
use super::int64x64::FRAC_BITS;

/// Fractional digits printed when no precision is requested
///
/// `2^-64 ≈ 5.4e-20`, so 20 digits pin down every representable value.
pub const DEFAULT_PRECISION: usize = 20;

/// `10^38 < 2^128`: more fractional digits than this are ignored
const MAX_FRACTION_DIGITS: usize = 38;

/// Largest integer part accepted before the range check (`|i64::MIN|`)
const INTEGER_LIMIT: u128 = 1 << 63;

pub(crate) fn format(value: i128, precision: usize) -> String {
    let magnitude = value.unsigned_abs();
    let mut integer = magnitude >> FRAC_BITS;
    let mut fraction = magnitude as u64;

    let mut digits = Vec::with_capacity(precision);
    for _ in 0..precision {
        let (digit, rest) = times_ten(fraction);
        digits.push(digit);
        fraction = rest;
    }

    let (next, rest) = times_ten(fraction);
    let last_odd = match digits.last() {
        Some(digit) => digit % 2 == 1,
        None => integer % 2 == 1,
    };
    if next > 5 || (next == 5 && (rest != 0 || last_odd)) {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == 9 {
                *digit = 0;
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            integer += 1;
        }
    }

    let mut out = String::with_capacity(precision + 22);
    out.push(if value < 0 { '-' } else { '+' });
    out.push_str(&integer.to_string());
    if precision > 0 {
        out.push('.');
        out.extend(digits.iter().map(|d| char::from(b'0' + d)));
    }
    out
}

#[inline(always)]
fn times_ten(fraction: u64) -> (u8, u64) {
    let wide = u128::from(fraction) * 10;
    ((wide >> FRAC_BITS) as u8, wide as u64)
}

pub(crate) fn parse(text: &str) -> Result<i128, ParseTimeError> {
    let trimmed = text.trim();
    let (negative, body, offset) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..], 1),
        Some(b'+') => (false, &trimmed[1..], 1),
        _ => (false, trimmed, 0),
    };

    let mut seen_point = false;
    for (position, found) in body.chars().enumerate() {
        match found {
            '0'..='9' => {}
            '.' if !seen_point => seen_point = true,
            _ => {
                return Err(ParseTimeError::InvalidDigit {
                    found,
                    position: position + offset,
                })
            }
        }
    }

    // body is pure ASCII from here on
    let (integer_digits, fraction_digits) = body.split_once('.').unwrap_or((body, ""));
    if integer_digits.is_empty() && fraction_digits.is_empty() {
        return Err(ParseTimeError::Empty);
    }

    let mut integer: u128 = 0;
    for b in integer_digits.bytes() {
        integer = integer * 10 + u128::from(b - b'0');
        if integer > INTEGER_LIMIT {
            return Err(ParseTimeError::Overflow);
        }
    }

    let magnitude = (integer << FRAC_BITS) + parse_fraction(fraction_digits);
    let limit = if negative { 1 << 127 } else { (1 << 127) - 1 };
    if magnitude > limit {
        return Err(ParseTimeError::Overflow);
    }

    Ok(if negative {
        (magnitude as i128).wrapping_neg()
    } else {
        magnitude as i128
    })
}

/// `round(N / 10^n * 2^64)`; the result may be exactly `2^64` after rounding
fn parse_fraction(digits: &str) -> u128 {
    let mut numerator: u128 = 0;
    let mut denominator: u128 = 1;
    for b in digits.bytes().take(MAX_FRACTION_DIGITS) {
        numerator = numerator * 10 + u128::from(b - b'0');
        denominator *= 10;
    }

    let mut remainder = numerator;
    let mut bits: u128 = 0;
    for _ in 0..FRAC_BITS {
        remainder <<= 1;
        bits <<= 1;
        if remainder >= denominator {
            remainder -= denominator;
            bits |= 1;
        }
    }
    bits + u128::from(remainder >= denominator - remainder)
}
