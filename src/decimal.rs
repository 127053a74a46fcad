//! Exact decimal amounts.
//!
//! Fixed-width files carry money as digit strings, so amounts are kept as an
//! unscaled integer plus a scale rather than as floating point.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::TransformError;

/// `digits * 10^-scale`.
///
/// Equality ignores trailing fractional zeros: `1050.00 == 1050`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decimal {
    digits: i128,
    scale: u32,
}

impl Decimal {
    pub const ZERO: Decimal = Decimal::new(0, 0);

    /// Largest scale text input is accepted at; `i128` holds 38 full digits.
    pub const MAX_SCALE: u32 = 38;

    pub const fn new(digits: i128, scale: u32) -> Self {
        Self { digits, scale }
    }

    /// The unscaled digits.
    pub fn digits(&self) -> i128 {
        self.digits
    }

    /// Number of fractional digits.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_negative(&self) -> bool {
        self.digits < 0
    }

    /// Unscaled digits of this value at `scale`.
    ///
    /// Returns `None` when reaching `scale` would drop non-zero digits or
    /// overflow.
    pub fn rescaled(&self, scale: u32) -> Option<i128> {
        if scale >= self.scale {
            self.digits.checked_mul(10i128.checked_pow(scale - self.scale)?)
        } else {
            let divisor = 10i128.checked_pow(self.scale - scale)?;
            (self.digits % divisor == 0).then(|| self.digits / divisor)
        }
    }

    pub fn checked_add(&self, other: &Decimal) -> Option<Decimal> {
        let scale = self.scale.max(other.scale);
        let digits = self.rescaled(scale)?.checked_add(other.rescaled(scale)?)?;
        Some(Decimal::new(digits, scale))
    }

    fn normalized(&self) -> (i128, u32) {
        let (mut digits, mut scale) = (self.digits, self.scale);
        while scale > 0 && digits % 10 == 0 {
            digits /= 10;
            scale -= 1;
        }
        (digits, scale)
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Decimal {}

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal::new(value as i128, 0)
    }
}

impl FromStr for Decimal {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TransformError::invalid(format!("{s:?} is not a decimal number"));
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if int_part.len() + frac_part.len() == 0
            || !all_digits(int_part)
            || !all_digits(frac_part)
        {
            return Err(invalid());
        }
        let mut digits: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            digits = digits
                .checked_mul(10)
                .and_then(|d| d.checked_add(i128::from(b - b'0')))
                .ok_or_else(invalid)?;
        }
        let scale = u32::try_from(frac_part.len())
            .ok()
            .filter(|scale| *scale <= Decimal::MAX_SCALE)
            .ok_or_else(invalid)?;
        Ok(Decimal::new(if negative { -digits } else { digits }, scale))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.digits < 0 { "-" } else { "" };
        let magnitude = self.digits.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{sign}{magnitude}");
        }
        // at least one integer digit before the point
        let padded = format!("{magnitude:0>width$}", width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_trailing_zeros() {
        assert_eq!(Decimal::new(105000, 2), Decimal::new(1050, 0));
        assert_ne!(Decimal::new(105001, 2), Decimal::new(1050, 0));
        assert_eq!(Decimal::ZERO, Decimal::new(0, 4));
    }

    #[test]
    fn test_parse_and_display() {
        let amount: Decimal = "1050.00".parse().unwrap();
        assert_eq!(amount.digits(), 105000);
        assert_eq!(amount.scale(), 2);
        assert_eq!(amount.to_string(), "1050.00");

        let small: Decimal = "-0.05".parse().unwrap();
        assert!(small.is_negative());
        assert_eq!(small.to_string(), "-0.05");

        assert!("12a".parse::<Decimal>().is_err());
        assert!("".parse::<Decimal>().is_err());
        assert!("-".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_scale_is_bounded() {
        let longest = format!("0.{}", "1".repeat(38));
        assert_eq!(longest.parse::<Decimal>().unwrap().scale(), Decimal::MAX_SCALE);
        let too_long = format!("0.{}", "1".repeat(39));
        assert!(too_long.parse::<Decimal>().is_err());
    }

    #[test]
    fn test_display_any_scale() {
        assert_eq!(Decimal::new(1, 40).to_string(), format!("0.{}1", "0".repeat(39)));
        assert_eq!(Decimal::new(-12345, 2).to_string(), "-123.45");
        assert_eq!(Decimal::new(5, 3).to_string(), "0.005");
    }

    #[test]
    fn test_rescaled() {
        let amount = Decimal::new(1050, 0);
        assert_eq!(amount.rescaled(2), Some(105000));

        let cents = Decimal::new(10505, 3);
        assert_eq!(cents.rescaled(2), None);
        assert_eq!(Decimal::new(10500, 3).rescaled(2), Some(1050));
    }

    #[test]
    fn test_checked_add_aligns_scales() {
        let a = Decimal::new(1050, 0);
        let b: Decimal = "0.25".parse().unwrap();
        assert_eq!(a.checked_add(&b), Some(Decimal::new(105025, 2)));
    }
}
