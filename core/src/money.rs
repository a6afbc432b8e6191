//! Money value object (cents-based to avoid floating point errors).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// A zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from dollars with overflow checking
    #[must_use]
    pub const fn checked_from_dollars(dollars: u64) -> Option<Self> {
        match dollars.checked_mul(100) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Splits the amount evenly into `parts` shares.
    ///
    /// When the amount does not divide evenly, the leftover cents go one each
    /// to the first shares, so the shares always sum exactly to the original
    /// amount and differ by at most one cent.
    ///
    /// Returns `None` when `parts` is zero.
    #[must_use]
    pub fn checked_split_even(self, parts: u32) -> Option<Vec<Self>> {
        if parts == 0 {
            return None;
        }
        let parts_u64 = u64::from(parts);
        let base = self.0 / parts_u64;
        let remainder = self.0 % parts_u64;

        Some(
            (0..parts_u64)
                .map(|i| Self(if i < remainder { base + 1 } else { base }))
                .collect(),
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn from_dollars() {
        assert_eq!(Money::checked_from_dollars(100).unwrap().cents(), 10_000);
        assert!(Money::checked_from_dollars(u64::MAX).is_none());
    }

    #[test]
    fn split_even_exact() {
        let shares = Money::from_cents(10_000).checked_split_even(2).unwrap();
        assert_eq!(shares, vec![Money::from_cents(5000), Money::from_cents(5000)]);
    }

    #[test]
    fn split_even_distributes_remainder_cents_to_first_shares() {
        let shares = Money::from_cents(10_001).checked_split_even(3).unwrap();
        assert_eq!(
            shares,
            vec![
                Money::from_cents(3334),
                Money::from_cents(3334),
                Money::from_cents(3333),
            ]
        );
        let total: u64 = shares.iter().map(|s| s.cents()).sum();
        assert_eq!(total, 10_001);
    }

    #[test]
    fn split_by_zero_parts_fails() {
        assert!(Money::from_cents(100).checked_split_even(0).is_none());
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Money::from_cents(5001)), "$50.01");
        assert_eq!(format!("{}", Money::ZERO), "$0.00");
    }
}
