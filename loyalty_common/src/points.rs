use std::{
    fmt::Display,
    iter::Sum,
    ops::Add,
    str::FromStr,
};

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Number of decimal places tracked by the ledger.
pub const POINTS_DECIMAL_PLACES: u32 = 2;
const SCALE: i64 = 100;

//--------------------------------------       Points        ---------------------------------------------------------
/// An exact loyalty-point amount, held as an integer number of hundredths.
///
/// All ledger arithmetic happens on the integer representation, both in memory and in the database
/// (`current = current + ?`). Conversion to and from human-readable decimals goes through [`Decimal`], so floating
/// point never touches a balance. On the wire, amounts are plain JSON numbers (e.g. `500.5`).
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash)]
#[sqlx(transparent)]
pub struct Points(i64);

op!(binary Points, Add, add);
op!(binary Points, Sub, sub);
op!(inplace Points, AddAssign, add_assign);
op!(inplace Points, SubAssign, sub_assign);
op!(unary Points, Neg, neg);

impl Sum for Points {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a Points> for Points {
    fn sum<I: Iterator<Item = &'a Points>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, p| acc + *p)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented in points: {0}")]
pub struct PointsConversionError(String);

impl Points {
    pub const ZERO: Points = Points(0);

    /// Creates an amount from a raw count of hundredths, e.g. `Points::from_hundredths(1550)` is 15.50.
    pub const fn from_hundredths(value: i64) -> Self {
        Self(value)
    }

    /// Creates an amount from a whole number of points.
    pub const fn from_whole(value: i64) -> Self {
        Self(value * SCALE)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, POINTS_DECIMAL_PLACES)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

impl TryFrom<Decimal> for Points {
    type Error = PointsConversionError;

    /// Amounts with more than two decimal places are rounded half away from zero.
    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        let rounded = value.round_dp_with_strategy(POINTS_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
        rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|d| d.to_i64())
            .map(Self)
            .ok_or_else(|| PointsConversionError(format!("{value} is out of range")))
    }
}

impl From<Points> for Decimal {
    fn from(value: Points) -> Self {
        value.to_decimal()
    }
}

impl FromStr for Points {
    type Err = PointsConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let d = Decimal::from_str(s.trim()).map_err(|e| PointsConversionError(format!("{s}: {e}")))?;
        Self::try_from(d)
    }
}

impl Display for Points {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.to_decimal(), serializer)
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let d = rust_decimal::serde::float::deserialize(deserializer)?;
        Points::try_from(d).map_err(serde::de::Error::custom)
    }
}
