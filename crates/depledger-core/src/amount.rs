//! # Native Currency Amounts
//!
//! `Amount` counts base units of the native currency in a `u128`. One whole
//! unit is 10^18 base units, so `"1.0"` and `1_000_000_000_000_000_000`
//! denote the same value.
//!
//! Amounts serialize as decimal base-unit strings. JSON numbers cannot hold
//! a `u128` portably and canonical serialization rejects floats, so the
//! string form is the only wire representation.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of fractional decimal digits in one whole unit.
pub const DECIMALS: u32 = 18;

const UNIT: u128 = 10u128.pow(DECIMALS);

/// A non-negative amount of native currency, in base units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u128);

impl Amount {
    /// Zero.
    pub const ZERO: Amount = Amount(0);

    /// Create an amount from base units.
    pub const fn from_base_units(units: u128) -> Self {
        Self(units)
    }

    /// Create an amount of `whole` full units.
    pub fn from_whole(whole: u64) -> Self {
        Self(u128::from(whole) * UNIT)
    }

    /// Base units.
    pub fn base_units(&self) -> u128 {
        self.0
    }

    /// Whether the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition. `None` on overflow.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction. `None` if `other > self`.
    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Parse a decimal amount of whole units such as `"1"`, `"0.5"` or
    /// `"12.000000000000000001"`.
    ///
    /// At most 18 fractional digits are accepted. Signs, exponents and
    /// separators are rejected.
    pub fn parse_decimal(s: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidAmount {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("whole part must be one or more digits"));
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("fractional part must be digits"));
        }
        if s.contains('.') && frac.is_empty() {
            return Err(invalid("fractional part must not be empty"));
        }
        if frac.len() > DECIMALS as usize {
            return Err(invalid("more than 18 fractional digits"));
        }

        let whole_units: u128 = whole.parse().map_err(|_| invalid("whole part overflows"))?;
        let frac_units: u128 = if frac.is_empty() {
            0
        } else {
            let scale = 10u128.pow(DECIMALS - frac.len() as u32);
            frac.parse::<u128>().map_err(|_| invalid("fractional part overflows"))? * scale
        };

        whole_units
            .checked_mul(UNIT)
            .and_then(|w| w.checked_add(frac_units))
            .map(Amount)
            .ok_or_else(|| invalid("amount overflows"))
    }

    /// Render as a decimal amount of whole units, trimming trailing
    /// fractional zeros but keeping at least one fractional digit
    /// (`"1.0"`, `"0.5"`, `"12.000000000000000001"`).
    pub fn format_decimal(&self) -> String {
        let whole = self.0 / UNIT;
        let frac = self.0 % UNIT;
        let mut frac_str = format!("{frac:018}");
        while frac_str.len() > 1 && frac_str.ends_with('0') {
            frac_str.pop();
        }
        format!("{whole}.{frac_str}")
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_decimal())
    }
}

impl Serialize for Amount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<u128>()
            .map(Amount)
            .map_err(|e| serde::de::Error::custom(format!("invalid base-unit amount {raw:?}: {e}")))
    }
}
