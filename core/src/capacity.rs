//! Capacity pool: the total/claimed counters and the invariant between them.
//!
//! All operations are pure — they compute the *next* pool value instead of
//! mutating stored state, so the engine can decide in memory from a snapshot
//! and let the conditional write re-validate the decision.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Total slot count of an offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Capacity(u32);

impl Capacity {
    /// Creates a new `Capacity`
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the capacity value
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors from pool operations. These are business-rule rejections, never
/// retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapacityError {
    /// The reservation would push the claimed count past the total capacity.
    #[error("capacity exceeded: {requested} requested, {available} of {capacity} available")]
    Exceeded {
        /// Total capacity of the pool.
        capacity: u32,
        /// Slots already claimed.
        claimed: u32,
        /// Slots the caller asked for.
        requested: u32,
        /// Slots actually available.
        available: u32,
    },

    /// The new capacity is below the number of slots already claimed.
    #[error("cannot resize capacity to {requested}: {claimed} slots already claimed")]
    BelowClaimed {
        /// Requested new total.
        requested: u32,
        /// Slots already claimed.
        claimed: u32,
    },
}

/// A capacity-bounded pool of slots.
///
/// Invariant: `0 <= claimed <= capacity` after every operation. A reservation
/// that would violate the bound is rejected, never silently truncated.
///
/// # Examples
///
/// ```
/// use huddle_core::capacity::{Capacity, CapacityPool};
///
/// let pool = CapacityPool::new(Capacity::new(2));
/// let pool = pool.try_reserve(1).unwrap();
/// let pool = pool.try_reserve(1).unwrap();
/// assert!(pool.is_full());
/// assert!(pool.try_reserve(1).is_err());
///
/// let pool = pool.release(1);
/// assert_eq!(pool.available(), 1);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityPool {
    total: Capacity,
    claimed: u32,
}

impl CapacityPool {
    /// Creates an empty pool with the given total capacity.
    #[must_use]
    pub const fn new(total: Capacity) -> Self {
        Self { total, claimed: 0 }
    }

    /// Total capacity of the pool.
    #[must_use]
    pub const fn total(self) -> Capacity {
        self.total
    }

    /// Slots currently claimed.
    #[must_use]
    pub const fn claimed(self) -> u32 {
        self.claimed
    }

    /// Slots still available (computed, not stored).
    #[must_use]
    pub const fn available(self) -> u32 {
        self.total.value().saturating_sub(self.claimed)
    }

    /// Whether every slot is claimed.
    #[must_use]
    pub const fn is_full(self) -> bool {
        self.available() == 0
    }

    /// Reserve `n` slots.
    ///
    /// Succeeds iff `claimed + n <= capacity` and returns the pool with the
    /// slots taken.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError::Exceeded`] when fewer than `n` slots remain.
    pub fn try_reserve(self, n: u32) -> Result<Self, CapacityError> {
        let next = self.claimed.saturating_add(n);
        if next > self.total.value() {
            return Err(CapacityError::Exceeded {
                capacity: self.total.value(),
                claimed: self.claimed,
                requested: n,
                available: self.available(),
            });
        }
        Ok(Self {
            total: self.total,
            claimed: next,
        })
    }

    /// Return `n` slots to the pool. Saturates at zero; never fails.
    #[must_use]
    pub const fn release(self, n: u32) -> Self {
        Self {
            total: self.total,
            claimed: self.claimed.saturating_sub(n),
        }
    }

    /// Change the total capacity.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError::BelowClaimed`] if `new_total` is smaller than
    /// the claimed count — existing claims are never truncated to fit.
    pub fn resize(self, new_total: Capacity) -> Result<Self, CapacityError> {
        if new_total.value() < self.claimed {
            return Err(CapacityError::BelowClaimed {
                requested: new_total.value(),
                claimed: self.claimed,
            });
        }
        Ok(Self {
            total: new_total,
            claimed: self.claimed,
        })
    }

    /// Rebuild the pool with the claimed count observed from the actual claim
    /// records.
    ///
    /// The stored claimed count is a denormalized value; it is reconciled
    /// against the claim set on every load so it can never silently drift.
    #[must_use]
    pub const fn reconcile(self, observed_claims: u32) -> Self {
        Self {
            total: self.total,
            claimed: observed_claims,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn reserve_until_full() {
        let pool = CapacityPool::new(Capacity::new(2));
        let pool = pool.try_reserve(1).unwrap();
        assert_eq!(pool.claimed(), 1);
        assert_eq!(pool.available(), 1);

        let pool = pool.try_reserve(1).unwrap();
        assert!(pool.is_full());

        let err = pool.try_reserve(1).unwrap_err();
        assert_eq!(
            err,
            CapacityError::Exceeded {
                capacity: 2,
                claimed: 2,
                requested: 1,
                available: 0,
            }
        );
    }

    #[test]
    fn reserve_is_rejected_not_truncated() {
        let pool = CapacityPool::new(Capacity::new(3));
        let pool = pool.try_reserve(2).unwrap();
        // 1 slot left, asking for 2 fails outright
        assert!(pool.try_reserve(2).is_err());
        assert_eq!(pool.claimed(), 2);
    }

    #[test]
    fn release_saturates_at_zero() {
        let pool = CapacityPool::new(Capacity::new(5));
        let pool = pool.release(3);
        assert_eq!(pool.claimed(), 0);
        assert_eq!(pool.available(), 5);
    }

    #[test]
    fn resize_below_claimed_is_rejected() {
        let pool = CapacityPool::new(Capacity::new(4)).try_reserve(3).unwrap();
        let err = pool.resize(Capacity::new(2)).unwrap_err();
        assert_eq!(
            err,
            CapacityError::BelowClaimed {
                requested: 2,
                claimed: 3,
            }
        );
        // pool untouched by the failed resize
        assert_eq!(pool.total().value(), 4);
    }

    #[test]
    fn resize_to_claimed_count_is_allowed() {
        let pool = CapacityPool::new(Capacity::new(4)).try_reserve(3).unwrap();
        let pool = pool.resize(Capacity::new(3)).unwrap();
        assert!(pool.is_full());
    }

    #[test]
    fn reconcile_overrides_claimed() {
        let pool = CapacityPool::new(Capacity::new(4)).try_reserve(1).unwrap();
        let pool = pool.reconcile(3);
        assert_eq!(pool.claimed(), 3);
        assert_eq!(pool.available(), 1);
    }

    proptest! {
        /// For any sequence of reserve/release/resize operations the invariant
        /// `0 <= claimed <= capacity` holds at every step.
        #[test]
        fn invariant_holds_under_any_op_sequence(
            capacity in 0_u32..16,
            ops in proptest::collection::vec((0_u8..3, 0_u32..8), 0..64),
        ) {
            let mut pool = CapacityPool::new(Capacity::new(capacity));
            for (op, n) in ops {
                pool = match op {
                    0 => pool.try_reserve(n).unwrap_or(pool),
                    1 => pool.release(n),
                    _ => pool.resize(Capacity::new(n)).unwrap_or(pool),
                };
                prop_assert!(pool.claimed() <= pool.total().value());
                prop_assert_eq!(
                    pool.available(),
                    pool.total().value() - pool.claimed()
                );
            }
        }
    }
}
