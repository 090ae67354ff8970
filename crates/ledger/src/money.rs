use std::{
    cmp::Ordering,
    fmt,
    ops::{Add, Sub},
    str::FromStr,
};

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::EngineError;

/// Exact monetary amount backed by a fixed-point decimal.
///
/// Use this type for **all** balances and amounts in the ledger: there is no
/// binary floating point anywhere between parsing and storage.
///
/// The canonical string form has no exponent and no trailing fractional
/// zeros, and it round-trips through [`FromStr`] without loss. It is also the
/// representation persisted in the database.
///
/// # Examples
///
/// ```rust
/// use ledger::Money;
///
/// let balance: Money = "100000".parse().unwrap();
/// let amount: Money = "50000.50".parse().unwrap();
/// assert_eq!((balance - amount).to_string(), "49999.5");
/// assert!(amount < balance);
/// assert!("12,5".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, Hash)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    #[must_use]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Builds an amount from an integer number of minor units, e.g.
    /// `Money::from_minor(1050, 2)` is `10.5`.
    #[must_use]
    pub fn from_minor(minor: i64, scale: u32) -> Self {
        Self(Decimal::new(minor, scale))
    }

    #[must_use]
    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    #[must_use]
    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Number of significant fractional digits.
    #[must_use]
    pub fn scale(self) -> u32 {
        self.0.normalize().scale()
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
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Money {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_zero() {
            return f.write_str("0");
        }
        write!(f, "{}", self.0.normalize())
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

/// # Panics
///
/// Panics when the sum leaves the range of `Decimal`. Use
/// [`Money::checked_add`] for amounts that are not known to be small.
impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

/// # Panics
///
/// Panics when the difference leaves the range of `Decimal`. Use
/// [`Money::checked_sub`] for amounts that are not known to be small.
impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a plain decimal string.
    ///
    /// Accepts an optional leading `+`/`-` and `.` as the only decimal
    /// separator. Exponents, grouping separators and empty input are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAmount(format!("malformed amount: {s:?}"));

        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        if digits.is_empty() {
            return Err(invalid());
        }

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (digits, None),
        };
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if !all_digits(int_part) || !frac_part.is_none_or(all_digits) {
            return Err(invalid());
        }
        if int_part.is_empty() && frac_part.is_none_or(str::is_empty) {
            return Err(invalid());
        }

        let int_part = if int_part.is_empty() { "0" } else { int_part };
        let plain = match frac_part {
            Some(frac) if !frac.is_empty() => format!("{int_part}.{frac}"),
            _ => int_part.to_string(),
        };
        let value = Decimal::from_str(&plain)
            .map_err(|_| EngineError::InvalidAmount(format!("amount out of range: {s:?}")))?;

        Ok(Money(if negative { -value } else { value }))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(money("100000").to_string(), "100000");
        assert_eq!(money("10.50").to_string(), "10.5");
        assert_eq!(money("0.00").to_string(), "0");
        assert_eq!(money("-0").to_string(), "0");
        assert_eq!(money("+1.25").to_string(), "1.25");
        assert_eq!(Money::from_minor(1050, 2).to_string(), "10.5");
    }

    #[test]
    fn canonical_form_round_trips() {
        for raw in ["0.1", "123456789012345678.99", "-42.0001", "7"] {
            let parsed = money(raw);
            assert_eq!(money(&parsed.to_string()), parsed);
        }
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for raw in ["", " ", "-", "abc", "1e5", "1,000", "12,5", "1.2.3", ".", "1_000", "0x10"] {
            assert!(
                matches!(raw.parse::<Money>(), Err(EngineError::InvalidAmount(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn exact_decimal_arithmetic() {
        let sum = (0..10).fold(Money::ZERO, |acc, _| acc + money("0.1"));
        assert_eq!(sum, money("1"));
        assert_eq!(money("0.3") - money("0.1"), money("0.2"));
        assert!(money("0.1") < money("0.10000001"));
        assert!(money("5") <= money("5.00"));
        assert!(money("-1").is_negative());
        assert!(!Money::ZERO.is_positive());
    }

    #[test]
    fn checked_arithmetic_detects_overflow() {
        let max = Money::new(Decimal::MAX);
        assert!(max.checked_add(money("1")).is_none());
        assert_eq!(money("1").checked_sub(money("2")), Some(money("-1")));
    }

    #[test]
    #[should_panic]
    fn operator_add_panics_on_overflow() {
        let _ = Money::new(Decimal::MAX) + money("1");
    }

    #[test]
    #[should_panic]
    fn operator_sub_panics_on_overflow() {
        let _ = Money::new(Decimal::MIN) - money("1");
    }

    #[test]
    fn scale_ignores_trailing_zeros() {
        assert_eq!(money("10.500").scale(), 1);
        assert_eq!(money("10").scale(), 0);
        assert_eq!(money("0.001").scale(), 3);
    }

    #[test]
    fn serde_uses_canonical_string() {
        let json = serde_json::to_string(&money("10.50")).unwrap();
        assert_eq!(json, "\"10.5\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, money("10.5"));
        assert!(serde_json::from_str::<Money>("\"nope\"").is_err());
    }
}
