use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use crate::EngineError;

/// Number of minor units per whole unit (8 decimal places).
pub const MINOR_PER_UNIT: i64 = 100_000_000;

/// Money amount represented as **integer minor units** at 8 decimal places.
///
/// Use this type for **all** monetary values in the engine (balances, stake
/// amounts, payouts) to avoid floating-point drift.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::from_minor(250_000_000);
/// assert_eq!(amount.minor(), 250_000_000);
/// assert_eq!(amount.to_string(), "2.5");
/// ```
///
/// Parsing from decimal strings (rejects more than 8 fraction digits):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("7.5".parse::<Money>().unwrap().minor(), 750_000_000);
/// assert!("0.123456789".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates an amount from raw minor units.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Creates an amount from whole units.
    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units * MINOR_PER_UNIT)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Multiplies by a basis-point factor (10_000 bp = 1.0x), truncating
    /// toward zero. Used for potential-payout computation.
    #[must_use]
    pub fn mul_bp(self, bp: i64) -> Option<Money> {
        let scaled = i128::from(self.0).checked_mul(i128::from(bp))? / 10_000;
        i64::try_from(scaled).ok().map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / MINOR_PER_UNIT as u64;
        let frac = abs % MINOR_PER_UNIT as u64;
        if frac == 0 {
            return write!(f, "{sign}{units}");
        }
        let frac = format!("{frac:08}");
        write!(f, "{sign}{units}.{}", frac.trim_end_matches('0'))
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a decimal string into minor units.
    ///
    /// Accepts an optional leading `+`/`-` and at most 8 fraction digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (sign, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (-1i64, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (1i64, stripped)
        } else {
            (1i64, trimmed)
        };

        if rest.is_empty() {
            return Err(empty());
        }

        let mut parts = rest.split('.');
        let units_str = parts.next().ok_or_else(invalid)?;
        let frac_str = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }

        if units_str.is_empty() || !units_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let units: i64 = units_str.parse().map_err(|_| invalid())?;

        let frac: i64 = match frac_str {
            None | Some("") => 0,
            Some(frac) => {
                if frac.len() > 8 || !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(EngineError::InvalidAmount(
                        "too many decimals".to_string(),
                    ));
                }
                let parsed: i64 = frac.parse().map_err(|_| invalid())?;
                parsed * 10i64.pow(8 - frac.len() as u32)
            }
        };

        let total = units
            .checked_mul(MINOR_PER_UNIT)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(overflow)?;

        let signed = if sign < 0 {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(Money(signed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_trims_trailing_zeros() {
        assert_eq!(Money::ZERO.to_string(), "0");
        assert_eq!(Money::from_units(12).to_string(), "12");
        assert_eq!(Money::from_minor(750_000_000).to_string(), "7.5");
        assert_eq!(Money::from_minor(1).to_string(), "0.00000001");
        assert_eq!(Money::from_minor(-450_000_000).to_string(), "-4.5");
    }

    #[test]
    fn parse_accepts_up_to_eight_decimals() {
        assert_eq!("10".parse::<Money>().unwrap().minor(), 1_000_000_000);
        assert_eq!("7.5".parse::<Money>().unwrap().minor(), 750_000_000);
        assert_eq!("0.00000001".parse::<Money>().unwrap().minor(), 1);
        assert_eq!("-2.25".parse::<Money>().unwrap().minor(), -225_000_000);
    }

    #[test]
    fn parse_rejects_more_than_eight_decimals() {
        assert!("0.000000001".parse::<Money>().is_err());
        assert!("1.123456789".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
    }

    #[test]
    fn mul_bp_scales_by_basis_points() {
        let stake = Money::from_units(25);
        assert_eq!(stake.mul_bp(20_000), Some(Money::from_units(50)));
        assert_eq!(stake.mul_bp(10_000), Some(stake));
        assert_eq!(Money::from_minor(3).mul_bp(15_000), Some(Money::from_minor(4)));
    }
}
