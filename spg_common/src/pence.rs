use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const GBP_CURRENCY_CODE: &str = "GBP";
pub const GBP_CURRENCY_CODE_LOWER: &str = "gbp";

//--------------------------------------       Pence         ---------------------------------------------------------
/// An exact amount of money in pounds sterling, stored as a whole number of pence.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Pence(i64);

op!(binary Pence, Add, add);
op!(binary Pence, Sub, sub);
op!(inplace Pence, AddAssign, add_assign);
op!(inplace Pence, SubAssign, sub_assign);
op!(unary Pence, Neg, neg);

impl Mul<i64> for Pence {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Pence {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in pence: {0}")]
pub struct PenceConversionError(String);

impl From<i64> for Pence {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Pence {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Pence {}

impl TryFrom<u64> for Pence {
    type Error = PenceConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(PenceConversionError(format!("Value {} is too large to convert to Pence", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Pence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(f, "{sign}£{}.{:02}", magnitude / 100, magnitude % 100)
    }
}

impl Pence {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_pounds(pounds: i64) -> Self {
        Self(pounds * 100)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}
