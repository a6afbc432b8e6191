//! Claim store trait and related types.
//!
//! This module defines the persistence boundary of the claim ledger: a store
//! that can read an offer together with its claims in one consistent snapshot
//! and apply version-conditioned atomic writes.
//!
//! # Design
//!
//! The `ClaimStore` trait is deliberately minimal. It provides exactly what
//! the engine needs:
//!
//! - One consistent read of an offer and its claims (same partition, same
//!   snapshot)
//! - Conditional writes keyed on the offer's version token (compare-and-swap)
//! - Atomic multi-record writes: the offer update and the claim insert or
//!   removal land together or not at all
//!
//! Partial application — offer updated but claim not recorded, or vice versa
//! — is the primary correctness hazard this contract exists to prevent, so
//! every multi-record write MUST be atomic at the storage layer (a single
//! transaction or a single conditional batch write).
//!
//! # Implementations
//!
//! - `InMemoryClaimStore` (in `huddle-testing`): fast, deterministic
//!   reference implementation backing the unit, integration, and stress tests
//! - Any document/key-value store with conditional-put support can implement
//!   this trait; no distributed-lock infrastructure is required
//!
//! # Dyn Compatibility
//!
//! This trait uses explicit `Pin<Box<dyn Future>>` returns instead of
//! `async fn` to enable trait object usage (`Arc<dyn ClaimStore>`), which is
//! how the engine and the façades hold their store.

use crate::ids::{OfferId, ParentId, UserId};
use crate::record::{ClaimRecord, OfferRecord, OfferSnapshot};
use crate::version::Version;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during claim store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimStoreError {
    /// Optimistic concurrency conflict: the stored version no longer matches
    /// the version the writer read — another writer won the race.
    #[error("version conflict: expected {expected}, found {actual}")]
    Conflict {
        /// The version the writer expected the offer to be at.
        expected: Version,
        /// The actual stored version.
        actual: Version,
    },

    /// The offer targeted by a conditional write does not exist (it was
    /// deleted between the read and the write).
    #[error("offer not found")]
    NotFound,

    /// Transient storage failure (connection, timeout, ...).
    #[error("storage error: {0}")]
    Storage(String),

    /// The store failed to encode or decode a record.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ClaimStoreError {
    /// Whether retrying the whole read-decide-write cycle can succeed.
    ///
    /// Conflicts and transient storage failures are indistinguishable from
    /// the caller's perspective ("try again"); serialization failures are
    /// not going to get better on a retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Conflict { .. } | Self::NotFound | Self::Storage(_)
        )
    }
}

/// Persistence abstraction over the offer+claims item collection.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; multiple process instances may
/// write concurrently and correctness rests entirely on the version check,
/// never on in-process locking visible to only one instance.
pub trait ClaimStore: Send + Sync {
    /// Load an offer and all of its claims in one consistent read.
    ///
    /// Returns `None` when the offer does not exist. The claims MUST come
    /// from the same snapshot as the offer (same partition read) — the engine
    /// decides from this snapshot and relies on the conditional write to
    /// catch staleness.
    ///
    /// # Errors
    ///
    /// - `Storage`: the read failed
    /// - `Serialization`: a stored record could not be decoded
    fn load_snapshot(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<OfferSnapshot>, ClaimStoreError>> + Send + '_>>;

    /// List the claims held against an offer (read-only path for views).
    ///
    /// # Errors
    ///
    /// - `Storage`: the read failed
    fn load_claims(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ClaimRecord>, ClaimStoreError>> + Send + '_>>;

    /// Create a new offer.
    ///
    /// The offer must be at [`Version::INITIAL`].
    ///
    /// # Errors
    ///
    /// - `Conflict`: an offer with this identity already exists
    /// - `Storage`: the write failed
    fn insert_offer(
        &self,
        offer: OfferRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>>;

    /// Atomically write the updated offer and upsert a claim, conditioned on
    /// `expected_version`.
    ///
    /// The offer carries the incremented version and the new claimed count;
    /// the store only verifies that the stored version still equals
    /// `expected_version` before applying both records as a unit.
    ///
    /// # Errors
    ///
    /// - `Conflict`: the stored version moved on — reload and retry
    /// - `NotFound`: the offer was deleted concurrently
    /// - `Storage`: the write failed
    fn write_offer_and_claim(
        &self,
        expected_version: Version,
        offer: OfferRecord,
        claim: ClaimRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>>;

    /// Atomically write the updated offer and remove the claim held by
    /// `user_id`, conditioned on `expected_version`.
    ///
    /// # Errors
    ///
    /// Same as [`ClaimStore::write_offer_and_claim`].
    fn write_offer_and_remove_claim(
        &self,
        expected_version: Version,
        offer: OfferRecord,
        user_id: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>>;

    /// Conditionally write the offer record alone (capacity or notes update,
    /// cancellation). Claim records are untouched.
    ///
    /// # Errors
    ///
    /// Same as [`ClaimStore::write_offer_and_claim`].
    fn write_offer(
        &self,
        expected_version: Version,
        offer: OfferRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>>;

    /// Conditionally write an offer that has transitioned to `Completed` with
    /// its terminal settlement fields.
    ///
    /// Claim records are retained as the historical record of who held a
    /// slot; completion never deletes them.
    ///
    /// # Errors
    ///
    /// Same as [`ClaimStore::write_offer_and_claim`].
    fn write_completed_offer(
        &self,
        expected_version: Version,
        offer: OfferRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>>;

    /// Physically remove an offer and cascade to all of its claims.
    ///
    /// Removing an absent offer is a success — delete is idempotent.
    ///
    /// # Errors
    ///
    /// - `Storage`: the write failed
    fn remove_offer(
        &self,
        parent_id: ParentId,
        offer_id: OfferId,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClaimStoreError>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_error_display() {
        let error = ClaimStoreError::Conflict {
            expected: Version::new(5),
            actual: Version::new(7),
        };

        let display = format!("{error}");
        assert!(display.contains("expected 5"));
        assert!(display.contains("found 7"));
    }

    #[test]
    fn retryable_classification() {
        assert!(
            ClaimStoreError::Conflict {
                expected: Version::new(1),
                actual: Version::new(2),
            }
            .is_retryable()
        );
        assert!(ClaimStoreError::Storage("connection reset".to_string()).is_retryable());
        assert!(!ClaimStoreError::Serialization("bad bytes".to_string()).is_retryable());
    }
}
