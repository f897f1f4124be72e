//! Leaf value types that the standard library does not provide.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use thiserror::Error;

static DECIMAL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-])?(\d+)(?:\.(\d*))?(?:[eE]([+-]?\d+))?$").unwrap());

/// Largest number of digits after the decimal point.
pub const MAX_SCALE: u32 = 28;

/// Largest number of significant digits.
pub const MAX_PRECISION: usize = 29;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal literal '{0}'")]
pub struct ParseDecimalError(String);

/// An exact base-10 number with a fixed scale, as used for monetary JSON values.
///
/// The scale of the literal is preserved, so `2.30` and `2.3` are distinct values that
/// print differently. Exponents are folded into the scale when parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    negative: bool,
    // At least `scale + 1` digits, no redundant leading zeros.
    digits: String,
    scale: u32,
}

impl Decimal {
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Number of digits after the decimal point.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.digits.bytes().all(|b| b == b'0')
    }

    pub fn to_f64(&self) -> f64 {
        // The canonical text is always a valid float literal.
        self.to_string().parse().unwrap_or(f64::NAN)
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseDecimalError(s.to_string());
        let caps = DECIMAL_REGEX.captures(s.trim()).ok_or_else(invalid)?;

        let negative = caps.get(1).map_or(false, |m| m.as_str() == "-");
        let integer = caps.get(2).map_or("", |m| m.as_str());
        let fraction = caps.get(3).map_or("", |m| m.as_str());
        let exponent: i64 = match caps.get(4) {
            Some(m) => m.as_str().parse().map_err(|_| invalid())?,
            None => 0,
        };

        let mut digits = format!("{}{}", integer, fraction);
        let mut scale = fraction.len() as i64 - exponent;
        if scale < 0 {
            if -scale > MAX_PRECISION as i64 {
                return Err(invalid());
            }
            digits.push_str(&"0".repeat((-scale) as usize));
            scale = 0;
        }
        if scale > MAX_SCALE as i64 {
            return Err(invalid());
        }
        let scale = scale as u32;

        let keep = scale as usize + 1;
        let leading = digits.bytes().take_while(|&b| b == b'0').count();
        let strip = leading.min(digits.len().saturating_sub(keep));
        digits.drain(..strip);
        if digits.len() < keep {
            digits.insert_str(0, &"0".repeat(keep - digits.len()));
        }

        let significant = digits.trim_start_matches('0').len();
        if significant > MAX_PRECISION {
            return Err(invalid());
        }

        let mut decimal = Decimal {
            negative,
            digits,
            scale,
        };
        if decimal.is_zero() {
            decimal.negative = false;
        }
        Ok(decimal)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        let split = self.digits.len() - self.scale as usize;
        f.write_str(&self.digits[..split])?;
        if self.scale > 0 {
            write!(f, ".{}", &self.digits[split..])?;
        }
        Ok(())
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> String {
        s.parse::<Decimal>().unwrap().to_string()
    }

    #[test]
    fn test_preserves_scale() {
        assert_eq!(dec("2.30"), "2.30");
        assert_eq!(dec("2.3"), "2.3");
        assert_eq!(dec("42"), "42");
        assert_eq!(dec("-0.5"), "-0.5");
    }

    #[test]
    fn test_folds_exponent_into_scale() {
        assert_eq!(dec("1.5e2"), "150");
        assert_eq!(dec("15e-3"), "0.015");
        assert_eq!(dec("1E+1"), "10");
    }

    #[test]
    fn test_strips_leading_zeros() {
        assert_eq!(dec("007"), "7");
        assert_eq!(dec("000.120"), "0.120");
    }

    #[test]
    fn test_negative_zero_is_zero() {
        let zero: Decimal = "-0.00".parse().unwrap();
        assert!(!zero.is_negative());
        assert_eq!(zero.to_string(), "0.00");
    }

    #[test]
    fn test_rejects_out_of_range_and_garbage() {
        assert!("1e-40".parse::<Decimal>().is_err());
        assert!("1e40".parse::<Decimal>().is_err());
        assert!("abc".parse::<Decimal>().is_err());
        assert!("1.2.3".parse::<Decimal>().is_err());
        assert!("".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_to_f64() {
        assert_eq!("2.5".parse::<Decimal>().unwrap().to_f64(), 2.5);
    }
}
