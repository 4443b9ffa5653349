//! Token amounts with checked arithmetic
//!
//! SwarmPay amounts are unsigned integers in the token's smallest unit.
//! Every arithmetic path is checked: overflow or underflow surfaces as an
//! explicit error, never as wraparound. Fee and slash math uses basis
//! points over a fixed denominator.

use crate::{Result, SwarmPayError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

/// Denominator for basis-point math (10_000 bps = 100%)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// An amount of a token, in smallest units
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(pub u128);

impl Amount {
    /// Create a new amount
    pub fn new(value: u128) -> Self {
        Self(value)
    }

    /// The zero amount
    pub fn zero() -> Self {
        Self(0)
    }

    /// Check if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    pub fn checked_add(self, other: Amount) -> Result<Amount> {
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or(SwarmPayError::ArithmeticOverflow)
    }

    /// Checked subtraction; underflow is an overflow error to the caller
    pub fn checked_sub(self, other: Amount) -> Result<Amount> {
        self.0
            .checked_sub(other.0)
            .map(Amount)
            .ok_or(SwarmPayError::ArithmeticOverflow)
    }

    /// A basis-point fraction of this amount, truncated toward zero
    ///
    /// `fraction_bps(250)` is 2.5%. This is the single code path for both
    /// fee and slash math.
    pub fn fraction_bps(self, bps: u32) -> Result<Amount> {
        self.0
            .checked_mul(bps as u128)
            .map(|v| Amount(v / BPS_DENOMINATOR))
            .ok_or(SwarmPayError::ArithmeticOverflow)
    }

    /// Split evenly across `n` recipients: per-recipient share and the
    /// remainder left over from integer division
    pub fn split_even(self, n: u128) -> Result<(Amount, Amount)> {
        if n == 0 {
            return Err(SwarmPayError::ArithmeticOverflow);
        }
        Ok((Amount(self.0 / n), Amount(self.0 % n)))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |acc, a| {
            Amount(acc.0.saturating_add(a.0))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_add_overflow_is_explicit() {
        let a = Amount::new(u128::MAX);
        assert!(matches!(
            a.checked_add(Amount::new(1)),
            Err(SwarmPayError::ArithmeticOverflow)
        ));
    }

    #[test]
    fn checked_sub_underflow_is_explicit() {
        let a = Amount::new(10);
        assert!(a.checked_sub(Amount::new(11)).is_err());
        assert_eq!(a.checked_sub(Amount::new(10)).unwrap(), Amount::zero());
    }

    #[test]
    fn fraction_bps_truncates_toward_zero() {
        // 20% of 100 = 20; 2.5% of 101 = 2 (truncated)
        assert_eq!(Amount::new(100).fraction_bps(2_000).unwrap(), Amount::new(20));
        assert_eq!(Amount::new(101).fraction_bps(250).unwrap(), Amount::new(2));
    }

    #[test]
    fn split_even_keeps_remainder() {
        let (share, rem) = Amount::new(100).split_even(3).unwrap();
        assert_eq!(share, Amount::new(33));
        assert_eq!(rem, Amount::new(1));
    }
}
