use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// True when `value` can be used as an exchange rate.
pub fn is_finite_and_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Rejected rate value, kept in display form so non-finite inputs can be reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid rate: {0}")]
pub struct InvalidRate(pub String);

/// A strictly positive multiplier converting one unit of a denomination
/// symbol into a quote symbol.
///
/// The only ways to obtain a `Rate` go through [`Rate::new`],
/// [`Rate::from_f64`] or [`Rate::from_str`], so every value held by the
/// cache or returned by the resolver is known to be valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Rate(Decimal);

impl Rate {
    pub const ONE: Rate = Rate(Decimal::ONE);

    pub fn new(value: Decimal) -> Result<Self, InvalidRate> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(InvalidRate(value.to_string()))
        }
    }

    pub fn from_f64(value: f64) -> Result<Self, InvalidRate> {
        if !is_finite_and_positive(value) {
            return Err(InvalidRate(value.to_string()));
        }
        Decimal::from_f64(value)
            .ok_or_else(|| InvalidRate(value.to_string()))
            .and_then(Self::new)
    }

    pub fn value(self) -> Decimal {
        self.0
    }

    /// `1 / self`, or `None` if the reciprocal underflows to zero.
    pub fn inverse(self) -> Option<Self> {
        Decimal::ONE.checked_div(self.0).and_then(|v| Self::new(v).ok())
    }

    pub fn checked_mul(self, other: Rate) -> Option<Self> {
        self.scale(other.0)
    }

    pub fn checked_div(self, other: Rate) -> Option<Self> {
        self.0.checked_div(other.0).and_then(|v| Self::new(v).ok())
    }

    /// Multiplies by an arbitrary factor, rejecting results that leave the
    /// valid range.
    pub fn scale(self, factor: Decimal) -> Option<Self> {
        self.0.checked_mul(factor).and_then(|v| Self::new(v).ok())
    }
}

impl TryFrom<Decimal> for Rate {
    type Error = InvalidRate;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rate> for Decimal {
    fn from(rate: Rate) -> Self {
        rate.0
    }
}

impl FromStr for Rate {
    type Err = InvalidRate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| InvalidRate(s.to_string()))
            .and_then(Self::new)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
