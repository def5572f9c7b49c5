use std::fmt;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A non-negative, arbitrary-precision integer.
///
/// Used for coin positions (`start`/`end`), block numbers, token ids and
/// transfer amounts. All arithmetic is checked: an operation that would
/// need to truncate a value (e.g. narrowing to `u64` for a backend key)
/// returns [`ArithmeticError`] instead of silently wrapping.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BigAmount(BigUint);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("subtraction underflow: {minuend} - {subtrahend}")]
    Underflow { minuend: String, subtrahend: String },
    #[error("value {0} does not fit in a u64")]
    DoesNotFitU64(String),
    #[error("division by zero")]
    DivisionByZero,
}

impl BigAmount {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn from_u64(v: u64) -> Self {
        Self(BigUint::from(v))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked subtraction; `Err` rather than panicking or wrapping on underflow.
    pub fn checked_sub(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        if self.0 < rhs.0 {
            return Err(ArithmeticError::Underflow {
                minuend: self.0.to_string(),
                subtrahend: rhs.0.to_string(),
            });
        }
        Ok(Self(&self.0 - &rhs.0))
    }

    pub fn checked_add(&self, rhs: &Self) -> Self {
        Self(&self.0 + &rhs.0)
    }

    /// Checked (floor) division; `Err` rather than panicking on division by zero.
    pub fn checked_div(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(Self(&self.0 / &rhs.0))
    }

    /// Narrows to `u64`, failing rather than truncating if the value is too large.
    pub fn to_u64_checked(&self) -> Result<u64, ArithmeticError> {
        self.0
            .to_u64()
            .ok_or_else(|| ArithmeticError::DoesNotFitU64(self.0.to_string()))
    }

    pub fn to_bytes_be(&self) -> Vec<u8> {
        self.0.to_bytes_be()
    }

    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        Self(BigUint::from_bytes_be(bytes))
    }
}

impl From<u64> for BigAmount {
    fn from(v: u64) -> Self {
        Self::from_u64(v)
    }
}

impl From<u32> for BigAmount {
    fn from(v: u32) -> Self {
        Self::from_u64(v as u64)
    }
}

impl fmt::Display for BigAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_underflow_is_an_error_not_a_wrap() {
        let a = BigAmount::from_u64(5);
        let b = BigAmount::from_u64(10);
        assert!(a.checked_sub(&b).is_err());
    }

    #[test]
    fn add_is_exact_even_past_u64() {
        let huge = BigAmount::from_bytes_be(&[0xff; 16]);
        let one = BigAmount::from_u64(1);
        let sum = huge.checked_add(&one);
        assert!(sum.to_u64_checked().is_err());
    }

    #[test]
    fn ordering_matches_numeric_value() {
        assert!(BigAmount::from_u64(5) < BigAmount::from_u64(100));
    }
}
